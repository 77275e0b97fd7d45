use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde_json::{Value, json};

/// Seeds a running server with sample observations and prints the leaderboard.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL, e.g. http://localhost:1111
    url: String,

    count: u32,
}

fn sample(index: u32) -> Value {
    json!({
        "name": format!("observer {index}"),
        "meteors": (index * 37) % 501,
        "minutes": f64::from(15 + (index * 13) % 226),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let endpoint = format!("{}/api/observations", args.url.trim_end_matches('/'));
    let client = Client::new();

    let pb = ProgressBar::new(u64::from(args.count));
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut rejected = 0;
    for index in 0..args.count {
        pb.set_message(format!("Submitting observer {index}"));

        let res = client
            .post(&endpoint)
            .json(&sample(index))
            .send()
            .await
            .with_context(|| format!("Failed to reach {endpoint}"))?;

        if !res.status().is_success() {
            rejected += 1;
            pb.println(format!("Rejected observer {index}: {}", res.text().await?));
        }

        pb.inc(1);
    }
    pb.finish_with_message("Done");

    println!("Submitted: {}", args.count - rejected);
    println!("Rejected: {rejected}\n");

    let res = client.get(&endpoint).send().await?;
    if !res.status().is_success() {
        bail!("Leaderboard request failed with {}", res.status());
    }

    let observations: Vec<Value> = res.json().await?;
    for (rank, observation) in observations.iter().enumerate() {
        println!(
            "{:>3}. {:<40} {:>8.2}/h",
            rank + 1,
            observation["name"].as_str().unwrap_or_default(),
            observation["rate"].as_f64().unwrap_or(f64::INFINITY),
        );
    }

    Ok(())
}
