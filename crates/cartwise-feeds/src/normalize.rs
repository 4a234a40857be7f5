//! Normalization from raw feed records to the canonical catalog schema.
//!
//! This is the only place vendor field-name variants are known. Each
//! canonical field has one alias list; downstream code sees only
//! [`Item`] and [`Promotion`].

use std::str::FromStr;

use cartwise_core::{Item, Promotion};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{AcquisitionError, FeedKind, RecordError};
use crate::xml::{read_records, RawRecord};

/// Element names that delimit one priced product.
pub const PRICE_RECORD_TAGS: &[&str] = &["item", "product"];
/// Element names that delimit one promotion.
pub const PROMO_RECORD_TAGS: &[&str] = &["promotion", "sale"];

mod alias {
    pub const ITEM_CODE: &[&str] = &["itemcode"];
    pub const ITEM_NAME: &[&str] = &["itemname", "itemnm", "manufactureritemdescription"];
    pub const ITEM_PRICE: &[&str] = &["itemprice", "price"];
    pub const UNIT: &[&str] = &["unitofmeasure", "unitqty", "unit"];

    pub const PROMOTION_ID: &[&str] = &["promotionid"];
    pub const DESCRIPTION: &[&str] = &["promotiondescription", "promotiondesc"];
    pub const END_DATE: &[&str] = &["promotionenddate"];
    pub const END_HOUR: &[&str] = &["promotionendhour"];
    pub const REWARD_TYPE: &[&str] = &["rewardtype"];
    pub const DISCOUNT_RATE: &[&str] = &["discountrate"];
    pub const DISCOUNTED_PRICE: &[&str] = &["discountedprice", "discountedpricepermida"];
    pub const MIN_QTY: &[&str] = &["minqty"];
    pub const MAX_QTY: &[&str] = &["maxqty"];
    pub const MIN_PURCHASE: &[&str] = &["minpurchaseamnt", "minpurchaseamount"];
    pub const CLUB_ID: &[&str] = &["clubid"];
}

/// Parses a price feed into items, dropping malformed records.
///
/// # Errors
///
/// [`AcquisitionError::Xml`] if the document itself is malformed,
/// [`AcquisitionError::EmptyCatalog`] if no record survives.
pub fn parse_price_feed(xml: &str) -> Result<Vec<Item>, AcquisitionError> {
    let records = read_records(xml, PRICE_RECORD_TAGS)?;
    collect_valid(records, normalize_item, FeedKind::Price)
}

/// Parses a promo feed into promotions, dropping malformed records.
///
/// # Errors
///
/// [`AcquisitionError::Xml`] if the document itself is malformed,
/// [`AcquisitionError::EmptyCatalog`] if no record survives.
pub fn parse_promo_feed(xml: &str) -> Result<Vec<Promotion>, AcquisitionError> {
    let records = read_records(xml, PROMO_RECORD_TAGS)?;
    collect_valid(records, normalize_promotion, FeedKind::Promo)
}

fn collect_valid<T>(
    records: Vec<RawRecord>,
    normalize: fn(&RawRecord) -> Result<T, RecordError>,
    feed: FeedKind,
) -> Result<Vec<T>, AcquisitionError> {
    let total = records.len();
    let mut valid = Vec::with_capacity(total);
    for (idx, record) in records.iter().enumerate() {
        match normalize(record) {
            Ok(value) => valid.push(value),
            Err(e) => tracing::debug!(%feed, record = idx, error = %e, "dropping malformed record"),
        }
    }

    let dropped = total - valid.len();
    if dropped > 0 {
        tracing::warn!(%feed, total, dropped, "feed contained malformed records");
    }
    if valid.is_empty() {
        return Err(AcquisitionError::EmptyCatalog { feed });
    }
    Ok(valid)
}

/// Maps one raw price record to an [`Item`].
///
/// # Errors
///
/// Returns a [`RecordError`] if code, name or price is missing, or the price
/// is unparseable or negative.
pub fn normalize_item(record: &RawRecord) -> Result<Item, RecordError> {
    let code = record
        .first(alias::ITEM_CODE)
        .ok_or(RecordError::MissingField("item code"))?;
    let name = record
        .first(alias::ITEM_NAME)
        .ok_or(RecordError::MissingField("item name"))?;
    let raw_price = record
        .first(alias::ITEM_PRICE)
        .ok_or(RecordError::MissingField("item price"))?;
    let unit_price = parse_decimal(raw_price).ok_or_else(|| RecordError::InvalidValue {
        field: "item price",
        value: raw_price.to_owned(),
    })?;
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(RecordError::NegativePrice(raw_price.to_owned()));
    }

    Ok(Item {
        code: code.to_owned(),
        name: name.to_owned(),
        unit_price,
        unit: record.first(alias::UNIT).map(str::to_owned),
    })
}

/// Maps one raw promo record to a [`Promotion`].
///
/// Only id, reward type and at least one item code are required; the
/// remaining fields are optional and an unparseable optional value is
/// treated as absent.
///
/// # Errors
///
/// Returns a [`RecordError`] if a required field is missing.
pub fn normalize_promotion(record: &RawRecord) -> Result<Promotion, RecordError> {
    let promotion_id = record
        .first(alias::PROMOTION_ID)
        .ok_or(RecordError::MissingField("promotion id"))?;
    let reward_type = record
        .first(alias::REWARD_TYPE)
        .ok_or(RecordError::MissingField("reward type"))?;
    let item_codes: Vec<String> = record
        .all(alias::ITEM_CODE)
        .into_iter()
        .map(str::to_owned)
        .collect();
    if item_codes.is_empty() {
        return Err(RecordError::MissingField("promotion item codes"));
    }

    let decimal = |aliases: &[&str]| record.first(aliases).and_then(parse_decimal);

    Ok(Promotion {
        promotion_id: promotion_id.to_owned(),
        reward_type: reward_type.to_owned(),
        description: record
            .first(alias::DESCRIPTION)
            .unwrap_or_default()
            .to_owned(),
        discounted_price: decimal(alias::DISCOUNTED_PRICE),
        discount_rate: record
            .first(alias::DISCOUNT_RATE)
            .and_then(|raw| raw.trim().parse::<i64>().ok()),
        min_qty: decimal(alias::MIN_QTY),
        max_qty: decimal(alias::MAX_QTY),
        min_purchase_amount: decimal(alias::MIN_PURCHASE),
        club_id: record.first(alias::CLUB_ID).map(|c| c.trim().to_owned()),
        ends_at: record
            .first(alias::END_DATE)
            .and_then(|date| parse_end(date, record.first(alias::END_HOUR))),
        item_codes,
    })
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Parses a promotion end moment. Dates without a time end at 23:59:59.
fn parse_end(date: &str, hour: Option<&str>) -> Option<NaiveDateTime> {
    let date = date.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, fmt) {
            return Some(dt);
        }
    }

    let day = ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())?;

    let time = hour
        .and_then(|h| {
            let h = h.trim();
            // Some feeds repeat the date in the hour field.
            let h = h.rsplit([' ', 'T']).next().unwrap_or(h);
            NaiveTime::parse_from_str(h, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(h, "%H:%M"))
                .ok()
        })
        .or_else(|| NaiveTime::from_hms_opt(23, 59, 59))?;

    Some(day.and_time(time))
}
