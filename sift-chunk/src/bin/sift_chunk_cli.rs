use clap::Parser;
use sift_chunk::{ChunkSource, Chunker, FileType};
use std::fs;
use std::io::{self, Read};

/// A CLI tool to chunk page text into JSON output using sift-chunk.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// File name recorded on each chunk.
    #[arg(short, long, default_value = "stdin.txt")]
    file_name: String,

    /// Page number recorded on each chunk (1-based).
    #[arg(short, long, default_value_t = 1)]
    page_number: u32,

    /// Maximum length for each chunk, in characters (soft bound).
    #[arg(short, long, default_value_t = 1000)]
    max_chars: usize,

    /// Characters of overlap carried into the next chunk.
    #[arg(short, long, default_value_t = 200)]
    overlap_chars: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let text = if let Some(input_path) = args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let chunker = Chunker::new(args.max_chars, args.overlap_chars);
    let source = ChunkSource {
        file_name: &args.file_name,
        file_type: FileType::Text,
        page_number: args.page_number,
    };

    let chunks = chunker.chunk_page(&text, &source);
    let json_output = serde_json::to_string_pretty(&chunks)?;
    println!("{json_output}");

    Ok(())
}
