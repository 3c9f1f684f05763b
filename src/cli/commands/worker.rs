use crate::fanout::{serve_worker, RemoteTask};
use crate::fibonacci::FibonacciTask;
use anyhow::Result;
use tokio::io::BufReader;

/// Execute hidden worker command
///
/// プロセスプールの子プロセスとして動く。stdoutはプロトコル専用なので何も表示しない。
pub async fn execute_worker(kind: &str) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let output = tokio::io::stdout();

    match kind {
        FibonacciTask::KIND => {
            serve_worker::<FibonacciTask, _, _>(input, output).await?;
        }
        other => anyhow::bail!("Unknown worker kind: {other}"),
    }
    Ok(())
}
