use anyhow::{Context, Result};

use crate::config;
use crate::hackernews::{Client, ClientConfig, Hit};
use crate::launcher;
use crate::query::{Preset, SearchUrl};
use crate::ui;

/// Runs the interactive session: one blocking fetch of the front page,
/// then the event loop. A failed fetch still starts the session, with an
/// empty list and the error in the status line.
pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;

    let (stories, status) = match fetch(&cfg, Preset::Top) {
        Ok(hits) => {
            let status = format!("{} stories loaded.", hits.len());
            (hits, status)
        }
        Err(err) => (Vec::new(), format!("Fetch failed: {err:#}")),
    };

    let options = ui::Options {
        title: cfg.ui.title.clone(),
        status_message: status,
        stories,
        launcher: launcher::platform(),
        theme: ui::Theme::with_accent(&cfg.ui.accent),
    };

    ui::Model::new(options).run()
}

/// Non-interactive listing: title, link, and points, three lines per
/// story, in response order.
pub fn run_print(preset: Preset) -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let hits = fetch(&cfg, preset)?;

    for hit in &hits {
        println!("{}", hit.title);
        println!("{}", hit.url);
        println!("{}", hit.points);
    }

    Ok(())
}

fn fetch(cfg: &config::Config, preset: Preset) -> Result<Vec<Hit>> {
    let mut url = SearchUrl::parse(&cfg.api.endpoint)
        .with_context(|| format!("parse endpoint {}", cfg.api.endpoint))?;
    url.select(preset);

    let client = Client::new(ClientConfig {
        user_agent: cfg.api.user_agent.clone(),
        timeout: Some(cfg.api.timeout),
        http_client: None,
    })
    .context("build http client")?;

    let response = client.search(&url.render())?;
    Ok(response.hits)
}
