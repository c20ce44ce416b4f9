use anyhow::{Context, Result};
use babble_core::io::train_from_file;
use babble_core::{GenerationInput, NgramGraph};
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "babble")]
#[command(about = "Learns word n-grams from a text file and babbles new sentences")]
struct Args {
    /// Number of words per state
    #[arg(default_value_t = 3)]
    n: usize,

    /// Training text, one sentence per line
    #[arg(default_value = "data/sample.txt")]
    filename: String,

    /// Number of sentences to generate
    #[arg(default_value_t = 5)]
    num_sentences: usize,

    /// Seed for reproducible output
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop a sentence once it holds this many words
    #[arg(short, long)]
    max_words: Option<usize>,

    /// Extra attempts when a sentence copies a training line
    #[arg(long, default_value_t = 0)]
    nb_try: usize,

    /// Print the whole transition graph before babbling
    #[arg(long)]
    dump_graph: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("running on {} with n={}", args.filename, args.n);

    let mut graph = NgramGraph::with_seed(args.n, args.seed).context("cannot build the model")?;
    train_from_file(&mut graph, &args.filename)
        .with_context(|| format!("cannot train on {}", args.filename))?;

    let mut input = GenerationInput::new().with_nb_try(args.nb_try);
    input.set_max_words(args.max_words)?;

    if args.dump_graph {
        // Sorted so two runs on the same file print the same graph
        let mut states: Vec<_> = graph.iter().collect();
        states.sort_by(|a, b| a.0.cmp(b.0));

        println!("---------resulting graph: --------");
        for (state, successors) in states {
            let successors: Vec<String> = successors.iter().map(ToString::to_string).collect();
            println!("{state} -> [{}]", successors.join(", "));
        }
        println!("----------------------------------");
    }

    let starters: Vec<String> = graph.get_starters().iter().map(ToString::to_string).collect();
    let stoppers: Vec<String> = graph.get_stoppers().iter().map(ToString::to_string).collect();
    println!("num starters {}", starters.len());
    println!("\t{:?}", starters);
    println!("num ngrams {}", graph.len());
    println!("num stoppers {}", stoppers.len());
    println!("\t{:?}", stoppers);
    println!("------------------------------");

    for _ in 0..args.num_sentences {
        println!("{}", graph.generate_from(&input));
    }

    Ok(())
}
