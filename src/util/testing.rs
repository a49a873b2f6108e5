use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{Cell, CladeSpec, Forest, ForestBuilder};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    // Keep rayon's worker chatter out of test output
    let noisy_modules = ["rayon"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    // RUST_LOG wins, otherwise debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Forest with a single phylogeny: root cell plus one child per intensity.
///
/// Children are named `c1`, `c2`, ... and carry only the given channel.
pub fn star_forest(channel: &str, root_intensity: Option<f64>, children: &[f64]) -> Forest {
    let mut builder = ForestBuilder::new().with_channels(vec![channel.to_string()]);
    let mut root = Cell::new("root");
    if let Some(v) = root_intensity {
        root = root.with_fluorescence(channel, v);
    }
    let mut cells = vec![root];
    let mut specs = Vec::new();
    for (i, &v) in children.iter().enumerate() {
        let id = format!("c{}", i + 1);
        cells.push(Cell::new(id.clone()).with_fluorescence(channel, v));
        specs.push(CladeSpec::leaf(id));
    }
    builder
        .add_cells(cells)
        .expect("unique fixture cell ids");
    builder
        .add_phylogeny("star", Some(&CladeSpec::with_children("root", specs)))
        .expect("unique fixture clade names");
    builder.build()
}
