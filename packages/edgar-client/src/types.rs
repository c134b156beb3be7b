use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{EdgarError, Result};

/// Form filter meaning "every form type".
pub const ALL_FORMS: &str = "-0";

/// One page request against the search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Form types to include. Empty means all forms.
    pub forms: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl PageQuery {
    /// Query a single calendar day.
    pub fn for_day(date: NaiveDate, page: u32, page_size: u32) -> Self {
        Self {
            forms: Vec::new(),
            start: date,
            end: date,
            page,
            page_size,
        }
    }

    pub fn with_forms(mut self, forms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.forms = forms.into_iter().map(Into::into).collect();
        self
    }

    /// Result offset of the first hit on this page.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn forms_param(&self) -> String {
        if self.forms.is_empty() {
            ALL_FORMS.to_string()
        } else {
            self.forms.join(",")
        }
    }

    /// Query-string parameters in the order the search endpoint documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("forms", self.forms_param()),
            ("startdt", self.start.format("%Y-%m-%d").to_string()),
            ("enddt", self.end.format("%Y-%m-%d").to_string()),
            ("page", self.page.to_string()),
            ("from", self.offset().to_string()),
        ]
    }
}

/// Top-level search response.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub hits: HitsEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// A single hit. `_id` is `<accession>:<primary document path>`.
///
/// Missing or null fields decode as empty so that one bad hit is rejected
/// on its own by [`SearchHit::document_url`] instead of failing the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "_source", default, deserialize_with = "null_as_default")]
    pub source: HitSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HitSource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub adsh: String,
    #[serde(default, alias = "file_type", deserialize_with = "null_as_default")]
    pub form: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ciks: Vec<String>,
    #[serde(rename = "companyName", default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub display_names: Vec<String>,
    #[serde(
        rename = "filingDate",
        alias = "file_date",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub filing_date: Option<String>,
    #[serde(rename = "filingHref", default, skip_serializing_if = "Option::is_none")]
    pub filing_href: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SearchHit {
    pub fn accession(&self) -> &str {
        &self.source.adsh
    }

    pub fn form(&self) -> &str {
        &self.source.form
    }

    /// First owner identifier, zero padding intact.
    pub fn primary_cik(&self) -> Option<&str> {
        self.source.ciks.first().map(String::as_str)
    }

    /// Path of the primary document: everything after the first `:` of the id.
    pub fn primary_document(&self) -> Result<&str> {
        self.id
            .split_once(':')
            .map(|(_, doc)| doc)
            .ok_or_else(|| EdgarError::MalformedHit {
                id: self.id.clone(),
                reason: "id has no primary document segment".to_string(),
            })
    }

    /// Company name, falling back to the first display name.
    pub fn company_name(&self) -> String {
        self.source
            .company_name
            .clone()
            .or_else(|| self.source.display_names.first().cloned())
            .unwrap_or_default()
    }

    pub fn filing_date(&self) -> Option<NaiveDate> {
        self.source
            .filing_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    pub fn filing_href(&self) -> Option<&str> {
        self.source
            .filing_href
            .as_deref()
            .filter(|href| !href.is_empty())
    }

    /// Archive URL of the primary document.
    pub fn document_url(&self, archive_root: &str) -> Result<String> {
        let cik = self.primary_cik().ok_or_else(|| EdgarError::MalformedHit {
            id: self.id.clone(),
            reason: "hit has no owner identifiers".to_string(),
        })?;
        build_document_url(archive_root, cik, self.accession(), self.primary_document()?)
    }
}

/// `<archive-root>/<cik without padding>/<accession without dashes>/<primary doc>`
pub fn build_document_url(
    archive_root: &str,
    cik: &str,
    accession: &str,
    primary_document: &str,
) -> Result<String> {
    let cik = cik.trim_start_matches('0');
    if cik.is_empty() {
        return Err(EdgarError::MalformedHit {
            id: accession.to_string(),
            reason: "owner identifier is empty".to_string(),
        });
    }
    let accession: String = accession.chars().filter(|c| *c != '-').collect();
    Ok(format!(
        "{}/{}/{}/{}",
        archive_root.trim_end_matches('/'),
        cik,
        accession,
        primary_document
    ))
}
