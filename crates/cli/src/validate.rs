//! `examkit validate`: load and check an exam configuration.

use std::path::Path;

use examkit_config::{ExamConfig, Slot};
use examkit_normalize::CanonicalQuestionMap;

use crate::CliError;

pub fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config = ExamConfig::load(config_path).map_err(CliError::config)?;
    let map = CanonicalQuestionMap::build(&config);

    for (vi, v) in config.versions.iter().enumerate() {
        let placeholders = v.order.iter().filter(|s| **s == Slot::Placeholder).count();
        println!(
            "version {}: {} slot(s) ({} placeholder), {} canonical question(s), {} unpermuted",
            v.version,
            v.order.len(),
            placeholders,
            map.questions_in(vi),
            v.unpermuted_count(),
        );
    }
    println!(
        "ok: {} version(s), {} canonical question(s)",
        config.versions.len(),
        map.len()
    );
    Ok(())
}
