// 逐次版テキスト処理 - パイプラインと同じ変換を1つのループで行う

use super::transforms::apply_text_chain;
use crate::core::{LabError, LabResult};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// 読む → strip → uppercase → 書く を1行ずつ順に行う
///
/// 書き込んだ行数を返す。出力はパイプライン版とバイト単位で一致する。
pub async fn process_text_sequential(input: &Path, output: &Path) -> LabResult<usize> {
    let file = File::open(input)
        .await
        .map_err(|e| LabError::source_unavailable(input, e))?;
    let mut lines = BufReader::new(file).lines();

    let out = File::create(output)
        .await
        .map_err(|e| LabError::sink_write(output, e))?;
    let mut writer = BufWriter::new(out);

    let mut written = 0;
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| LabError::source_unavailable(input, e))?
    {
        let record = apply_text_chain(line)
            .map_err(|e| LabError::stage("sequential", written + 1, format!("{e:#}")))?;
        writer
            .write_all(record.as_bytes())
            .await
            .map_err(|e| LabError::sink_write(output, e))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| LabError::sink_write(output, e))?;
        written += 1;
    }

    writer
        .flush()
        .await
        .map_err(|e| LabError::sink_write(output, e))?;
    Ok(written)
}
