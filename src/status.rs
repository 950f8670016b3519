use tokio::{
    sync::mpsc::{self, UnboundedSender},
    task::JoinHandle,
};

/// Spawns the task that prints status lines to stdout in arrival order.
///
/// The task ends once every sender has been dropped.
pub fn spawn_status_printer() -> (UnboundedSender<String>, JoinHandle<usize>) {
    spawn_status_writer(|status| println!("{}", status))
}

pub(crate) fn spawn_status_writer<F>(mut write: F) -> (UnboundedSender<String>, JoinHandle<usize>)
where
    F: FnMut(&str) + Send + 'static,
{
    let (status_tx, mut status_rx) = mpsc::unbounded_channel::<String>();
    let handle = tokio::spawn(async move {
        let mut printed = 0;
        while let Some(status) = status_rx.recv().await {
            write(&status);
            printed += 1;
        }
        tracing::debug!("Status printer stopped after {} lines", printed);
        printed
    });
    (status_tx, handle)
}
