use std::collections::BTreeSet;

use crate::models::{PAGE_NO_FIELD, PagePayload, TENANT_FIELD};

#[derive(Clone, Debug, PartialEq)]
pub enum Match {
	Keyword(String),
	Integer(i64),
	AnyInteger(Vec<i64>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldCondition {
	pub key: String,
	pub matches: Match,
}

/// Conjunction of field conditions over page payloads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageFilter {
	pub must: Vec<FieldCondition>,
}
impl PageFilter {
	pub fn tenant(company_id: &str) -> Self {
		Self {
			must: vec![FieldCondition {
				key: TENANT_FIELD.to_string(),
				matches: Match::Keyword(company_id.to_string()),
			}],
		}
	}

	pub fn tenant_pages(company_id: &str, pages: &BTreeSet<u32>) -> Self {
		let mut filter = Self::tenant(company_id);

		filter.must.push(FieldCondition {
			key: PAGE_NO_FIELD.to_string(),
			matches: Match::AnyInteger(pages.iter().map(|page| i64::from(*page)).collect()),
		});

		filter
	}

	/// Evaluates the filter against a payload. Unknown keys never match.
	pub fn matches(&self, payload: &PagePayload) -> bool {
		self.must.iter().all(|condition| condition.matches_payload(payload))
	}
}

impl FieldCondition {
	fn matches_payload(&self, payload: &PagePayload) -> bool {
		match (self.key.as_str(), &self.matches) {
			(TENANT_FIELD, Match::Keyword(value)) => payload.company_id == *value,
			(PAGE_NO_FIELD, Match::Integer(value)) => i64::from(payload.page_no) == *value,
			(PAGE_NO_FIELD, Match::AnyInteger(values)) =>
				values.contains(&i64::from(payload.page_no)),
			_ => false,
		}
	}
}
