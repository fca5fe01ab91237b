//! Preference command handlers.

use serde::Serialize;

use offsync_core::{AccessibilitySettings, Preferences};

use crate::cli::{GlobalOpts, PrefsArgs, PrefsCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::open_store;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrefsView {
    tutorial_completed: bool,
    accessibility: AccessibilitySettings,
}

fn detail(p: &PrefsView) -> String {
    [
        format!("Tutorial completed: {}", p.tutorial_completed),
        format!("Font scale:         {}", p.accessibility.font_scale),
        format!("High contrast:      {}", p.accessibility.high_contrast),
        format!("Reduce motion:      {}", p.accessibility.reduce_motion),
    ]
    .join("\n")
}

pub async fn handle(args: PrefsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = config::resolve_store(global)?;
    let prefs = Preferences::new(open_store(&ctx));

    match args.command {
        PrefsCommand::Show => {}

        PrefsCommand::Set {
            tutorial_completed,
            font_scale,
            high_contrast,
            reduce_motion,
        } => {
            if let Some(done) = tutorial_completed {
                prefs.set_tutorial_completed(done).await.map_err(store_err)?;
            }

            if font_scale.is_some() || high_contrast.is_some() || reduce_motion.is_some() {
                let mut settings = prefs.accessibility().await;
                if let Some(scale) = font_scale {
                    if !(0.5..=3.0).contains(&scale) {
                        return Err(CliError::Validation {
                            field: "font_scale".into(),
                            reason: "must be between 0.5 and 3.0".into(),
                        });
                    }
                    settings.font_scale = scale;
                }
                if let Some(on) = high_contrast {
                    settings.high_contrast = on;
                }
                if let Some(on) = reduce_motion {
                    settings.reduce_motion = on;
                }
                prefs.set_accessibility(&settings).await.map_err(store_err)?;
            }
        }
    }

    let view = PrefsView {
        tutorial_completed: prefs.tutorial_completed().await,
        accessibility: prefs.accessibility().await,
    };
    let out = output::render_single(&global.output, &view, detail, |_| "prefs".into())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn store_err(e: offsync_core::KvError) -> CliError {
    match e {
        offsync_core::KvError::Io(io) => CliError::Io(io),
        other => CliError::Internal(other.to_string()),
    }
}
