use hostrelay_infrastructure::store::JsonHostStore;

pub async fn set(store: &JsonHostStore, key: &str, value: &str) -> anyhow::Result<()> {
    store.set(key, value).await?;
    println!("{} -> {}", key, value);
    Ok(())
}

pub async fn remove(store: &JsonHostStore, key: &str) -> anyhow::Result<()> {
    if !store.delete(key).await? {
        anyhow::bail!("No host entry named {}", key);
    }
    println!("Removed {}", key);
    Ok(())
}

pub async fn list(store: &JsonHostStore) -> anyhow::Result<()> {
    let entries = store.list().await?;
    if entries.is_empty() {
        println!("No host entries in {}", store.path().display());
        return Ok(());
    }

    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in entries {
        println!("{:<width$}  {}", key, value, width = width);
    }
    Ok(())
}
