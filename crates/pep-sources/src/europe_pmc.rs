//! Europe PMC article search client.
//!
//! Uses the REST `search` endpoint with `resultType=core` so abstracts,
//! journal titles and publication types come back in one call. Paging
//! follows `nextCursorMark` until the provider stops advancing it or
//! `max_results` records have been collected.

use pep_core::{LiteratureStudy, Study, entities::parse_year};
use pep_evidence::infer_literature_design;

use crate::{
    SourceClient,
    error::SourceError,
    http::{check_response, with_retry},
};

pub const SOURCE: &str = "europe_pmc";

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    next_cursor_mark: Option<String>,
    #[serde(default)]
    result_list: ResultList,
}

#[derive(serde::Deserialize, Default)]
struct ResultList {
    #[serde(default)]
    result: Vec<Record>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    id: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    pmid: Option<String>,
    #[serde(default)]
    doi: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author_string: Option<String>,
    #[serde(default)]
    journal_info: Option<JournalInfo>,
    #[serde(default)]
    pub_year: Option<String>,
    #[serde(default)]
    abstract_text: Option<String>,
    #[serde(default)]
    pub_type_list: Option<PubTypeList>,
}

#[derive(serde::Deserialize)]
struct JournalInfo {
    #[serde(default)]
    journal: Option<Journal>,
}

#[derive(serde::Deserialize)]
struct Journal {
    #[serde(default)]
    title: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct PubTypeList {
    #[serde(default)]
    pub_type: Vec<String>,
}

/// Free-text query: every term quoted and OR-joined.
#[must_use]
pub fn build_query(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

impl SourceClient {
    /// Search Europe PMC for articles mentioning any of `terms`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if a page request fails after retries or a
    /// response cannot be parsed.
    pub async fn search_europe_pmc(&self, terms: &[String]) -> Result<Vec<Study>, SourceError> {
        let query = build_query(terms);
        let max = self.settings.max_results as usize;
        let mut cursor = String::from("*");
        let mut studies = Vec::new();

        loop {
            let url = format!(
                "{}/search?query={}&resultType=core&format=json&pageSize={}&cursorMark={}",
                self.settings.europe_pmc_url.trim_end_matches('/'),
                urlencoding::encode(&query),
                self.settings.page_size,
                urlencoding::encode(&cursor),
            );
            let url = url.as_str();
            let page: SearchResponse = with_retry(&self.retry, SOURCE, || async move {
                let resp = check_response(self.http.get(url).send().await?).await?;
                let body = resp.text().await?;
                serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))
            })
            .await?;

            let fetched = page.result_list.result.len();
            studies.extend(page.result_list.result.into_iter().filter_map(map_record));
            tracing::debug!(source = SOURCE, fetched, total = studies.len(), "page fetched");

            let next = page.next_cursor_mark.unwrap_or_default();
            if fetched == 0 || studies.len() >= max || next.is_empty() || next == cursor {
                break;
            }
            cursor = next;
            self.throttle().await;
        }

        studies.truncate(max);
        Ok(studies)
    }
}

/// Map one provider record to a study. Records without a title are dropped.
fn map_record(record: Record) -> Option<Study> {
    let title = record.title.filter(|t| !t.trim().is_empty())?;
    let id = match record.pmid.filter(|p| !p.is_empty()) {
        Some(pmid) => format!("PMID:{pmid}"),
        None => format!(
            "{}:{}",
            record.source.as_deref().unwrap_or("EPMC").to_ascii_uppercase(),
            record.id
        ),
    };
    let pub_types = record.pub_type_list.map(|l| l.pub_type).unwrap_or_default();
    let study_design =
        infer_literature_design(&title, record.abstract_text.as_deref(), &pub_types);
    let authors: Vec<String> = record
        .author_string
        .map(|s| {
            s.trim_end_matches('.')
                .split(", ")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Study::Literature(LiteratureStudy {
        id,
        title: title.trim().to_string(),
        abstract_text: record.abstract_text,
        authors,
        journal: record
            .journal_info
            .and_then(|j| j.journal)
            .and_then(|j| j.title)
            .unwrap_or_default(),
        year: record.pub_year.as_deref().and_then(parse_year),
        doc_id: record.doi,
        study_design,
    }))
}
