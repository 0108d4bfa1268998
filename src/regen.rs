use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::{ApiError, SharedApi};
use crate::logging::{json_log, log, obj, v_str, Domain, Level};
use crate::model::{RegenAck, Section};
use crate::poller::PollingController;

/// Issues regenerate-section commands and forces the bound poller to re-fetch
/// immediately instead of waiting for its next scheduled tick.
pub struct SectionRegenerator {
    api: SharedApi,
    busy: AtomicBool,
}

impl SectionRegenerator {
    pub fn new(api: SharedApi) -> Self {
        Self { api, busy: AtomicBool::new(false) }
    }

    /// True while a regenerate call is outstanding. Views use this to disable
    /// the triggering control; concurrent calls are not otherwise deduplicated.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Send the command, then trigger one immediate re-fetch through the
    /// active poller. The re-fetch happens whether or not the backend
    /// accepted the command: displayed content is reconciled from the server,
    /// never updated optimistically.
    pub async fn regenerate(
        &self,
        poller: &PollingController,
        report_id: i64,
        section: Section,
    ) -> Result<RegenAck, ApiError> {
        self.busy.store(true, Ordering::SeqCst);
        json_log(
            Domain::Regen,
            "regenerate_requested",
            obj(&[
                ("report_id", serde_json::json!(report_id)),
                ("section", v_str(section.as_str())),
            ]),
        );

        let result = self.api.regenerate_section(report_id, section).await;
        poller.refresh_now();

        match &result {
            Ok(ack) => {
                json_log(
                    Domain::Regen,
                    "regenerate_accepted",
                    obj(&[
                        ("report_id", serde_json::json!(ack.id)),
                        ("message", v_str(&ack.message)),
                    ]),
                );
            }
            Err(err) => {
                log(
                    Level::Warn,
                    Domain::Regen,
                    "regenerate_failed",
                    obj(&[
                        ("report_id", serde_json::json!(report_id)),
                        ("section", v_str(section.as_str())),
                        ("error", v_str(&err.to_string())),
                    ]),
                );
            }
        }

        self.busy.store(false, Ordering::SeqCst);
        result
    }
}
