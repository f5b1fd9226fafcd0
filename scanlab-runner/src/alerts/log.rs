use scanlab_core::alert::{Alert, AlertError, AlertSink};
use tracing::info;

/// Writes alerts to the log instead of a chat. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&self, alert: Alert) -> Result<(), AlertError> {
        info!(
            symbol = %alert.symbol,
            direction = %alert.direction,
            entry = alert.entry,
            stop_loss = alert.stop_loss,
            take_profit = alert.take_profit,
            score = alert.score,
            chart = ?alert.chart.as_ref().map(|c| c.path().display().to_string()),
            "alert\n{}",
            alert.message()
        );
        Ok(())
    }
}
