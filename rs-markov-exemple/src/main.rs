use rs_markov_core::model::generate_options::StartSeed;
use rs_markov_core::store::MemoryStore;
use rs_markov_core::{MarkovConfig, MarkovEngine};
use tracing_subscriber::EnvFilter;

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_owned).collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Defaults are used when "./markov.toml" does not exist
    let config = MarkovConfig::load("./markov.toml")?;

    // Every chain lives in the same store, isolated by its prefix
    let store = MemoryStore::new();
    let engine = MarkovEngine::new(store, config.chain.clone())?;
    let food = engine.chain("food");

    // Train from "data/food.txt", one sentence per line
    let indexed = food.index_file(concat!(env!("CARGO_MANIFEST_DIR"), "/data/food.txt"))?;
    println!("Indexed {} sentences", indexed);

    // Sentences close to the training data score high, unseen transitions score 0
    for sentence in ["i ate a pizza", "i ate a sandwich", "we ate a pizza", "i ate one hammer"] {
        println!("Score of '{}': {:.2}", sentence, food.score(&words(sentence))?);
    }

    // How often does each completion follow "i ate"?
    println!(
        "'i ate' completions: max frequency {}, min frequency {}",
        food.max_frequency(&words("i ate"))?,
        food.min_frequency(&words("i ate"))?
    );

    // Continue a seed, at most 5 more words
    let seed = words("we ate");
    let generation = food.generate(Some(seed.as_slice()), 5)?;
    println!("Seeded: {} ({:?})", generation.tokens.join(" "), generation.stop);

    // Start from a random recorded window and prefer some words
    let mut options = engine.generate_options::<String>();
    options.start_seed = StartSeed::Random;
    options.relevant_terms = words("pizza soup");
    options.set_quality_floor(20.0)?;

    // Invalid floors are refused
    match options.set_quality_floor(150.0) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Refused: {}", e),
    }

    // Generate 10 sentences from the start of the chain
    for i in 0..10 {
        let generation = food.generate::<String>(None, config.chain.max_words)?;
        println!("Generated sentence {}: {}", i + 1, generation.tokens.join(" "));
    }
    for i in 0..3 {
        let generation = food.generate_with(&options)?;
        println!("Random start {}: {}", i + 1, generation.tokens.join(" "));
    }

    // Keep the trained chains for the server
    engine.store().save(&config.store.snapshot_path)?;
    println!("Saved to {}", config.store.snapshot_path.display());

    Ok(())
}
