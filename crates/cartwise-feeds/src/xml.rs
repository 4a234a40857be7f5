//! Generic record extraction from vendor XML feeds.
//!
//! Chains disagree on element names and nesting, so this reader only knows
//! which element names delimit a record. Every leaf element inside a record
//! becomes a `(name, text)` field; nested containers such as
//! `<PromotionItems>` are flattened, so repeated leaves (one `ItemCode` per
//! promoted item) appear as repeated fields.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::AcquisitionError;

/// One record's leaf fields in document order. Names are lowercased local
/// names (namespace prefixes dropped).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, String)>,
}

impl RawRecord {
    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(n, v)| (n.to_ascii_lowercase(), (*v).to_owned()))
                .collect(),
        }
    }

    /// First non-empty value among `aliases`, trying aliases in order.
    #[must_use]
    pub fn first(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.fields
                .iter()
                .find(|(name, value)| name == alias && !value.is_empty())
                .map(|(_, value)| value.as_str())
        })
    }

    /// Every non-empty value of any alias, in document order.
    #[must_use]
    pub fn all(&self, aliases: &[&str]) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(name, value)| !value.is_empty() && aliases.contains(&name.as_str()))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Reads every element named in `record_tags` (case-insensitive) as a record.
///
/// Records are not nested: once inside a record, an element with a record
/// name is treated as an ordinary container.
///
/// # Errors
///
/// Returns [`AcquisitionError::Xml`] if the document is not well-formed.
pub fn read_records(xml: &str, record_tags: &[&str]) -> Result<Vec<RawRecord>, AcquisitionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut record_depth: Option<usize> = None;
    let mut current = RawRecord::default();
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                text.clear();
                if record_depth.is_none() {
                    let name = local_name(e.local_name().as_ref());
                    if record_tags.iter().any(|t| t.eq_ignore_ascii_case(&name)) {
                        record_depth = Some(depth);
                        current = RawRecord::default();
                    }
                }
            }
            Event::Empty(e) => {
                if record_depth.is_some() {
                    let name = local_name(e.local_name().as_ref());
                    current.fields.push((name, String::new()));
                }
            }
            Event::Text(e) => {
                if record_depth.is_some() {
                    let chunk = e.unescape().unwrap_or_default();
                    text.push_str(chunk.trim());
                }
            }
            Event::CData(e) => {
                if record_depth.is_some() {
                    text.push_str(String::from_utf8_lossy(e.as_ref()).trim());
                }
            }
            Event::End(e) => {
                match record_depth {
                    Some(rd) if depth == rd => {
                        records.push(std::mem::take(&mut current));
                        record_depth = None;
                    }
                    Some(_) => {
                        if !text.is_empty() {
                            let name = local_name(e.local_name().as_ref());
                            current.fields.push((name, std::mem::take(&mut text)));
                        }
                    }
                    None => {}
                }
                text.clear();
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(records)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flat_item_records() {
        let xml = r"
            <Root>
              <ChainId>7290027600007</ChainId>
              <Items Count='2'>
                <Item><ItemCode>100</ItemCode><ItemName>Milk 3%</ItemName><ItemPrice>6.90</ItemPrice></Item>
                <Item><ItemCode>200</ItemCode><ItemNm>Bread</ItemNm><ItemPrice>8.50</ItemPrice></Item>
              </Items>
            </Root>";
        let records = read_records(xml, &["item"]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first(&["itemcode"]), Some("100"));
        assert_eq!(records[1].first(&["itemname", "itemnm"]), Some("Bread"));
    }

    #[test]
    fn matches_record_tags_case_insensitively() {
        let xml = "<root><items><item><itemcode>1</itemcode></item></items></root>";
        let records = read_records(xml, &["Item"]).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn flattens_nested_promotion_items() {
        let xml = r"
            <Promotions>
              <Promotion>
                <PromotionId>55</PromotionId>
                <RewardType>1</RewardType>
                <PromotionItems>
                  <Item><ItemCode>100</ItemCode><IsGiftItem>0</IsGiftItem></Item>
                  <Item><ItemCode>200</ItemCode><IsGiftItem>0</IsGiftItem></Item>
                </PromotionItems>
              </Promotion>
            </Promotions>";
        let records = read_records(xml, &["promotion"]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].all(&["itemcode"]), vec!["100", "200"]);
        assert_eq!(records[0].first(&["rewardtype"]), Some("1"));
    }

    #[test]
    fn empty_elements_yield_empty_fields() {
        let xml = "<Items><Item><ItemCode>1</ItemCode><ItemName/></Item></Items>";
        let records = read_records(xml, &["item"]).unwrap();
        assert_eq!(records[0].first(&["itemname"]), None);
    }

    #[test]
    fn unescapes_entities() {
        let xml = "<Items><Item><ItemName>Salt &amp; Pepper</ItemName></Item></Items>";
        let records = read_records(xml, &["item"]).unwrap();
        assert_eq!(records[0].first(&["itemname"]), Some("Salt & Pepper"));
    }

    #[test]
    fn malformed_document_is_an_error() {
        let xml = "<Items><Item><ItemCode>1</ItemName></Item></Items>";
        assert!(matches!(
            read_records(xml, &["item"]),
            Err(AcquisitionError::Xml(_))
        ));
    }

    #[test]
    fn first_prefers_earlier_alias() {
        let record = RawRecord::from_pairs(&[("ItemNm", "short"), ("ItemName", "long")]);
        assert_eq!(record.first(&["itemname", "itemnm"]), Some("long"));
    }
}
