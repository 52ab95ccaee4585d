use std::path::Path;
use tracing::{debug, trace};

/// Read the ticker list at `path`: one ticker per line, trimmed and lowercased, blank lines
/// skipped. Order is preserved.
pub async fn read_tickers(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let path = path.as_ref();
    trace!("reading ticker list: {}", path.display());
    let contents = tokio::fs::read_to_string(path).await.map_err(|err| {
        anyhow::anyhow!("failed to read ticker list {}: {err}", path.display())
    })?;

    let tickers = parse_tickers(&contents);
    debug!("{} tickers read from {}", tickers.len(), path.display());
    Ok(tickers)
}

pub fn parse_tickers(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Reads a `.json` file from `path`.
pub async fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    trace!("reading file path: {}", path.display());
    let file = tokio::fs::read(path).await?;
    trace!("file read; deserializing bytes ...");
    let data: T = serde_json::from_slice(&file)?;
    Ok(data)
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[test]
fn ticker_lines_are_normalized() {
    let tickers = parse_tickers("MXRF11\n\n  hglg11  \r\n\t\nKNRI11\n");
    assert_eq!(tickers, vec!["mxrf11", "hglg11", "knri11"]);
}

#[tokio::test]
async fn missing_ticker_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_tickers(dir.path().join("tickers.txt")).await.unwrap_err();
    assert!(err.to_string().contains("tickers.txt"));
}

#[tokio::test]
async fn reads_tickers_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickers.txt");
    tokio::fs::write(&path, "XPML11\nvisc11\n").await.unwrap();
    assert_eq!(read_tickers(&path).await.unwrap(), vec!["xpml11", "visc11"]);
}
