use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Write a synthetic CORD-19-style `metadata.csv`.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output file
    #[arg(short, long, default_value = "metadata.csv")]
    output: PathBuf,

    /// Number of data rows
    #[arg(short, long, default_value_t = 60_000)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

const JOURNALS: [&str; 12] = [
    "PLoS One",
    "bioRxiv",
    "BMJ",
    "Sci Rep",
    "Lancet",
    "Nature",
    "Journal of Virology",
    "Viruses",
    "Cureus",
    "Int J Environ Res Public Health",
    "Emerg Infect Dis",
    "Cell",
];

const SOURCES: [&str; 5] = ["PMC", "Medline", "WHO", "Elsevier", "MedRxiv"];

const TOPICS: [&str; 8] = [
    "coronavirus transmission",
    "SARS-CoV-2 spike protein",
    "vaccine efficacy",
    "ICU outcomes",
    "viral shedding",
    "public health response",
    "antiviral therapy",
    "mask effectiveness",
];

fn publish_time(rng: &mut SimpleRng) -> String {
    let year = match rng.below(10) {
        0 => 2000 + rng.below(19),
        1..=5 => 2020,
        6..=8 => 2021,
        _ => 2019,
    };
    let month = 1 + rng.below(12);
    let day = 1 + rng.below(28);
    // Mirror the real file: mostly ISO dates, some bare years, a few blanks.
    match rng.below(20) {
        0 => String::new(),
        1 | 2 => year.to_string(),
        _ => format!("{year}-{month:02}-{day:02}"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record([
        "cord_uid",
        "source_x",
        "title",
        "abstract",
        "publish_time",
        "authors",
        "journal",
    ])?;

    for i in 0..args.rows {
        let topic = rng.pick(&TOPICS);
        let title = format!("A study of {topic} ({i})");
        let abstract_text = format!(
            "We report findings on {topic}, with {} participants.",
            50 + rng.below(5000)
        );
        let authors = format!("Author {}, A.; Author {}, B.", rng.below(900), rng.below(900));
        let journal = if rng.below(15) == 0 {
            ""
        } else {
            rng.pick(&JOURNALS)
        };

        let uid = format!("{i:08x}");
        let source = rng.pick(&SOURCES);
        let published = publish_time(&mut rng);

        writer.write_record([
            uid.as_str(),
            source,
            title.as_str(),
            abstract_text.as_str(),
            published.as_str(),
            authors.as_str(),
            journal,
        ])?;
    }
    writer.flush()?;

    println!("Wrote {} rows to {}", args.rows, args.output.display());
    Ok(())
}
