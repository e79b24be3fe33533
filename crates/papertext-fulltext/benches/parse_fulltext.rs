use papertext_core::Accumulator;
use papertext_fulltext::transform::{FullTextAccumulator, PaperRecord};

/// Lines from `$BENCH_DATA_DIR/core_sample.jsonl`, or a synthetic set when unset
fn load_lines() -> Vec<String> {
    if let Ok(dir) = std::env::var("BENCH_DATA_DIR") {
        let path = std::path::Path::new(&dir).join("core_sample.jsonl");
        return std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("{}: {e}", path.display()))
            .lines()
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
    }
    let body = "Lorem ipsum dolor sit amet. ".repeat(2_000);
    (0..1_000)
        .map(|i| {
            let text = if i % 3 == 0 { "null".to_string() } else { format!("\"{body}\"") };
            format!(
                r#"{{"coreId":"{i}","title":"Paper {i}","authors":["A. Author","B. Author"],"datePublished":"2018-03-01","fullText":{text},"relations":[],"year":2018,"doi":"10.1/{i}","topics":["x","y"]}}"#
            )
        })
        .collect()
}

#[divan::bench]
fn parse_serde_json(bencher: divan::Bencher) {
    let lines = load_lines();
    bencher.bench(|| {
        for line in &lines {
            let _: PaperRecord = serde_json::from_str(line).unwrap();
        }
    });
}

#[divan::bench]
fn parse_sonic_rs(bencher: divan::Bencher) {
    let lines = load_lines();
    bencher.bench(|| {
        for line in &lines {
            let _: PaperRecord = sonic_rs::from_str(line).unwrap();
        }
    });
}

#[divan::bench]
fn filter_and_accumulate(bencher: divan::Bencher) {
    let lines = load_lines();
    bencher.bench(|| {
        let mut acc = FullTextAccumulator::new();
        for line in &lines {
            let record: PaperRecord = serde_json::from_str(line).unwrap();
            if let Some(row) = record.into_full_text_row() {
                acc.push(row);
            }
        }
        acc.take_batch().unwrap()
    });
}

fn main() {
    divan::main();
}
