use std::time::Instant;

use crate::action_executor::LoggingDispatcher;
use crate::launch_config::{Application, Intent, LaunchConfig};
use crate::resolver::Resolver;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn warm_keystroke_p95_under_15ms() {
    let applications = (0..10_000)
        .map(|i| Application {
            url: format!("https://apps.local/{i:05}"),
            title: format!("Document_{i:05}"),
        })
        .collect();
    let intents = (0..50)
        .map(|i| Intent {
            triggers: vec![format!("DO{i:02}"), format!("RUN{i:02}")],
            action: format!("action-{i:02}"),
            ..Default::default()
        })
        .collect();
    let config = LaunchConfig {
        applications,
        intents,
        ..Default::default()
    };

    let mut resolver = Resolver::from_config(config, Box::new(LoggingDispatcher));

    for _ in 0..30 {
        resolver.on_text_changed("Document_01", 11);
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(80);
        for _ in 0..80 {
            let start = Instant::now();
            resolver.on_text_changed("Document_01", 11);
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }
    assert_eq!(resolver.state().candidates().total_len(), 1_000);

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 15.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 15.0ms); batches={batch_p95:?}",
    );
}
