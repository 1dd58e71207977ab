use anyhow::Context;
use futures::StreamExt;
use mongodb::Collection;
use serde::de::DeserializeOwned;

/// Checks that the documents already stored in `collection` deserialize as `T`.
///
/// With `all` set every document is read, otherwise only the first one.
/// Returns the number of documents checked.
pub async fn verify<T>(collection: &Collection<T>, all: bool) -> anyhow::Result<usize>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut cursor = collection
        .find(None, None)
        .await
        .with_context(|| format!("Failed to read collection {}", collection.name()))?;

    let mut checked = 0;
    while let Some(document) = cursor.next().await {
        document.with_context(|| {
            format!(
                "Document #{} of collection {} is malformed",
                checked,
                collection.name()
            )
        })?;
        checked += 1;

        if !all {
            break;
        }
    }

    log::info!(
        "Verified {} document(s) of collection {}",
        checked,
        collection.name()
    );
    Ok(checked)
}
