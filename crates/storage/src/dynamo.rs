//! DynamoDB seam: capability trait, AWS client, and attribute-map
//! conversion for prediction day-records.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};
use tracing::debug;

use tide_common::{
    PredictionDayRecord, TideError, TideExtreme, TidePrediction, TideResult, TideType,
};

/// A DynamoDB item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// The DynamoDB operations the caches need.
///
/// Implemented by [`DynamoClient`] for production and by in-memory doubles
/// in tests.
#[async_trait]
pub trait DynamoDb: Send + Sync {
    async fn get_item(&self, table: &str, key: Item) -> TideResult<Option<Item>>;
    async fn put_item(&self, table: &str, item: Item) -> TideResult<()>;
    async fn batch_write(&self, table: &str, items: Vec<Item>) -> TideResult<()>;
}

/// DynamoDB client backed by the AWS SDK.
pub struct DynamoClient {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoClient {
    /// Build a client from the default AWS config chain, honoring
    /// `DYNAMODB_ENDPOINT` for local development.
    pub async fn from_env() -> Self {
        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        let client = match std::env::var("DYNAMODB_ENDPOINT") {
            Ok(endpoint) if !endpoint.is_empty() => {
                debug!(endpoint = %endpoint, "Using local DynamoDB endpoint");
                let config = aws_sdk_dynamodb::config::Builder::from(&shared_config)
                    .endpoint_url(endpoint)
                    .build();
                aws_sdk_dynamodb::Client::from_conf(config)
            }
            _ => aws_sdk_dynamodb::Client::new(&shared_config),
        };

        Self { client }
    }
}

#[async_trait]
impl DynamoDb for DynamoClient {
    async fn get_item(&self, table: &str, key: Item) -> TideResult<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| TideError::RemoteCache(format!("getting item: {e}")))?;

        Ok(output.item)
    }

    async fn put_item(&self, table: &str, item: Item) -> TideResult<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| TideError::RemoteCache(format!("putting item: {e}")))?;

        Ok(())
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> TideResult<()> {
        let requests = items
            .into_iter()
            .map(|item| {
                let put = PutRequest::builder()
                    .set_item(Some(item))
                    .build()
                    .map_err(|e| TideError::RemoteCache(format!("building put request: {e}")))?;
                Ok(WriteRequest::builder().put_request(put).build())
            })
            .collect::<TideResult<Vec<_>>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table, requests)
            .send()
            .await
            .map_err(|e| TideError::RemoteCache(format!("batch writing items: {e}")))?;

        let unprocessed = output
            .unprocessed_items
            .map(|m| m.values().map(Vec::len).sum::<usize>())
            .unwrap_or(0);
        if unprocessed > 0 {
            return Err(TideError::RemoteCache(format!(
                "{unprocessed} items left unprocessed by batch write"
            )));
        }

        Ok(())
    }
}

// === Attribute-map conversion ===
//
// Item shape: stationId S, date S, stationType S, predictions L<M>,
// extremes L<M>, lastUpdated N, ttl N. Nested maps carry timestamp N,
// localTime S, height N, and (extremes only) type S.

pub fn record_key(station_id: &str, date: &str) -> Item {
    Item::from([
        ("stationId".to_string(), attr_s(station_id)),
        ("date".to_string(), attr_s(date)),
    ])
}

pub fn record_to_item(record: &PredictionDayRecord) -> Item {
    let predictions = record
        .predictions
        .iter()
        .map(|p| {
            AttributeValue::M(Item::from([
                ("timestamp".to_string(), attr_n(p.timestamp)),
                ("localTime".to_string(), attr_s(&p.local_time)),
                ("height".to_string(), attr_n(p.height)),
            ]))
        })
        .collect();

    let extremes = record
        .extremes
        .iter()
        .map(|e| {
            AttributeValue::M(Item::from([
                ("type".to_string(), attr_s(tide_type_name(e.kind))),
                ("timestamp".to_string(), attr_n(e.timestamp)),
                ("localTime".to_string(), attr_s(&e.local_time)),
                ("height".to_string(), attr_n(e.height)),
            ]))
        })
        .collect();

    Item::from([
        ("stationId".to_string(), attr_s(&record.station_id)),
        ("date".to_string(), attr_s(&record.date)),
        ("stationType".to_string(), attr_s(&record.station_type)),
        ("predictions".to_string(), AttributeValue::L(predictions)),
        ("extremes".to_string(), AttributeValue::L(extremes)),
        ("lastUpdated".to_string(), attr_n(record.last_updated)),
        ("ttl".to_string(), attr_n(record.ttl)),
    ])
}

pub fn item_to_record(item: &Item) -> TideResult<PredictionDayRecord> {
    let predictions = get_list(item, "predictions")?
        .iter()
        .map(|value| {
            let map = as_map(value)?;
            Ok(TidePrediction {
                timestamp: get_i64(map, "timestamp")?,
                local_time: get_string(map, "localTime")?,
                height: get_f64(map, "height")?,
            })
        })
        .collect::<TideResult<Vec<_>>>()?;

    let extremes = get_list(item, "extremes")?
        .iter()
        .map(|value| {
            let map = as_map(value)?;
            Ok(TideExtreme {
                kind: parse_tide_type(&get_string(map, "type")?)?,
                timestamp: get_i64(map, "timestamp")?,
                local_time: get_string(map, "localTime")?,
                height: get_f64(map, "height")?,
            })
        })
        .collect::<TideResult<Vec<_>>>()?;

    Ok(PredictionDayRecord {
        station_id: get_string(item, "stationId")?,
        date: get_string(item, "date")?,
        station_type: get_string(item, "stationType")?,
        predictions,
        extremes,
        last_updated: get_i64(item, "lastUpdated")?,
        ttl: get_i64(item, "ttl")?,
    })
}

fn attr_s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn attr_n(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

fn tide_type_name(kind: TideType) -> &'static str {
    match kind {
        TideType::Rising => "RISING",
        TideType::Falling => "FALLING",
        TideType::High => "HIGH",
        TideType::Low => "LOW",
    }
}

fn parse_tide_type(name: &str) -> TideResult<TideType> {
    match name {
        "RISING" => Ok(TideType::Rising),
        "FALLING" => Ok(TideType::Falling),
        "HIGH" => Ok(TideType::High),
        "LOW" => Ok(TideType::Low),
        other => Err(malformed(format!("unknown tide type: {other}"))),
    }
}

fn as_map(value: &AttributeValue) -> TideResult<&Item> {
    value
        .as_m()
        .map_err(|_| malformed("expected a map attribute".to_string()))
}

fn get_attr<'a>(item: &'a Item, name: &str) -> TideResult<&'a AttributeValue> {
    item.get(name)
        .ok_or_else(|| malformed(format!("missing attribute {name}")))
}

fn get_string(item: &Item, name: &str) -> TideResult<String> {
    get_attr(item, name)?
        .as_s()
        .cloned()
        .map_err(|_| malformed(format!("attribute {name} is not a string")))
}

fn get_i64(item: &Item, name: &str) -> TideResult<i64> {
    let raw = get_attr(item, name)?
        .as_n()
        .map_err(|_| malformed(format!("attribute {name} is not a number")))?;
    raw.parse()
        .map_err(|_| malformed(format!("attribute {name} is not an integer: {raw}")))
}

fn get_f64(item: &Item, name: &str) -> TideResult<f64> {
    let raw = get_attr(item, name)?
        .as_n()
        .map_err(|_| malformed(format!("attribute {name} is not a number")))?;
    raw.parse()
        .map_err(|_| malformed(format!("attribute {name} is not a decimal: {raw}")))
}

fn get_list<'a>(item: &'a Item, name: &str) -> TideResult<&'a [AttributeValue]> {
    match item.get(name) {
        None => Ok(&[]),
        Some(value) => value
            .as_l()
            .map(Vec::as_slice)
            .map_err(|_| malformed(format!("attribute {name} is not a list"))),
    }
}

fn malformed(detail: String) -> TideError {
    TideError::RemoteCache(format!("malformed cache item: {detail}"))
}
