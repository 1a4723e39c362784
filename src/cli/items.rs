use super::{GroupArgs, KeyArgs, ListArgs, SetArgs};
use crate::client::{PitOps, StoreClient};
use crate::manager::PitManager;
use anyhow::{bail, Result};
use futures::StreamExt;
use serde_json::Value;

/// 解析命令行传入的值，不是合法JSON时按字符串处理
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn ready_client(manager: &PitManager) -> Result<StoreClient> {
    let client = manager.store_client();
    client.boot().await;
    if !client.is_ready().await {
        bail!("Store is not ready, run `oxpit migrate` and check the logs");
    }
    Ok(client)
}

pub async fn get(manager: &PitManager, args: &KeyArgs) -> Result<()> {
    let client = ready_client(manager).await?;
    match client.get(&args.key, &args.group).await {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("(not found)"),
    }
    Ok(())
}

pub async fn set(manager: &PitManager, args: &SetArgs) -> Result<()> {
    let client = ready_client(manager).await?;
    client
        .set(&args.key, parse_value(&args.value), &args.group)
        .await;
    println!("OK");
    Ok(())
}

pub async fn delete(manager: &PitManager, args: &KeyArgs) -> Result<()> {
    let client = ready_client(manager).await?;
    client.delete(&args.key, &args.group).await;
    println!("OK");
    Ok(())
}

pub async fn flush(manager: &PitManager, args: &GroupArgs) -> Result<()> {
    let client = ready_client(manager).await?;
    client.flush_group(&args.group).await;
    println!("OK");
    Ok(())
}

pub async fn list(manager: &PitManager, args: &ListArgs) -> Result<()> {
    let client = ready_client(manager).await?;
    let mut items = client.group(&args.group);
    let mut count = 0usize;

    while let Some(item) = items.next().await {
        if args.limit.is_some_and(|limit| count >= limit) {
            break;
        }
        println!("{}\t{}", item.key(), item.value());
        count += 1;
    }

    println!("({} item(s))", count);
    Ok(())
}
