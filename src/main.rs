//! # Flowline CLI
//!
//! Usage:
//!   flowline input.json -o pages.json
//!   flowline input.json --config layout.json
//!   echo '{ ... }' | flowline
//!   flowline --example > document.json

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_document_json());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("✗ {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let input = match args.get(1).filter(|a| !a.starts_with('-')) {
        Some(path) => fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buf
        }
    };

    let flag = |name: &str| args.windows(2).find(|w| w[0] == name).map(|w| w[1].clone());

    let config = match flag("--config") {
        Some(path) => Some(fs::read_to_string(&path).map_err(|e| format!("Failed to read {}: {}", path, e))?),
        None => None,
    };

    let json = flowline::layout_json(&input, config.as_deref()).map_err(|e| e.to_string())?;

    match flag("-o") {
        Some(path) => {
            fs::write(&path, &json).map_err(|e| format!("Failed to write {}: {}", path, e))?;
            eprintln!("✓ Written {} bytes to {}", json.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn example_document_json() -> &'static str {
    r##"{
  "page": {
    "width": 420,
    "height": 595,
    "margin": { "top": 48, "right": 48, "bottom": 48, "left": 48 }
  },
  "paragraphs": [
    {
      "block": {
        "align": "Justify",
        "font": { "family": "Times", "size": 11 },
        "lineHeight": 1.3,
        "textIndent": 18,
        "spaceAfter": 8
      },
      "fragments": [
        {
          "text": "Flowline breaks text into lines, ",
          "font": { "family": "Times", "size": 11 }
        },
        {
          "text": "justifies",
          "font": { "family": "Times", "weight": 700, "size": 11 },
          "style": { "decoration": { "underline": true } }
        },
        {
          "text": " them to the column width and places every glyph on a resolved baseline. Soft hy\u00ADphens, CJK punctuation rules and inline objects are all taken into account.",
          "font": { "family": "Times", "size": 11 }
        }
      ]
    },
    {
      "block": {
        "align": "Left",
        "font": { "family": "Helvetica", "size": 10 }
      },
      "fragments": [
        {
          "text": "Chapter One",
          "font": { "family": "Helvetica", "size": 10 }
        },
        {
          "object": { "handle": 1, "kind": "DotTab", "width": 0, "height": 0 },
          "font": { "family": "Helvetica", "size": 10 }
        },
        {
          "text": "1",
          "font": { "family": "Helvetica", "size": 10 }
        }
      ]
    }
  ]
}
"##
}
