//! Loading lineage documents from the backend.

use log::{debug, info};
use reqwest::Url;

use crate::components::lineage::LineageData;
use crate::error::LineageError;

/// Turns a possibly relative source into an absolute URL, resolved against `base`.
pub fn resolve_source(source: &str, base: Option<&str>) -> Result<Url, LineageError> {
	if let Ok(url) = Url::parse(source) {
		return Ok(url);
	}
	let invalid = || LineageError::InvalidSource(source.to_string());
	let base = base.ok_or_else(invalid)?;
	Url::parse(base)
		.and_then(|base| base.join(source))
		.map_err(|_| invalid())
}

/// Decodes and checks a lineage document.
pub fn parse_lineage(body: &str) -> Result<LineageData, LineageError> {
	let data: LineageData = serde_json::from_str(body)?;
	data.validate()?;
	Ok(data)
}

fn page_base() -> Option<String> {
	web_sys::window()?.location().href().ok()
}

/// Fetches the lineage at `source`, relative sources resolve against the current page.
pub async fn fetch_lineage(source: &str) -> Result<LineageData, LineageError> {
	let url = resolve_source(source, page_base().as_deref())?;
	debug!("fetching lineage from {url}");

	let request_failed = |err: reqwest::Error| LineageError::Request {
		url: url.to_string(),
		message: err.to_string(),
	};
	let response = reqwest::get(url.clone()).await.map_err(request_failed)?;
	let status = response.status();
	if !status.is_success() {
		return Err(LineageError::Status {
			url: url.to_string(),
			status: status.as_u16(),
		});
	}
	let body = response.text().await.map_err(request_failed)?;
	let data = parse_lineage(&body)?;
	info!(
		"loaded lineage {} ({} nodes) from {url}",
		data.root_node.id, data.total_nodes
	);
	Ok(data)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn relative_sources_resolve_against_the_page() {
		let base = "https://studio.example/assets?tab=x";
		let url = resolve_source("/api/lineage/42", Some(base)).unwrap();
		assert_eq!(url.as_str(), "https://studio.example/api/lineage/42");
	}

	#[test]
	fn absolute_sources_are_kept() {
		let url = resolve_source("https://api.example/lineage/1", None).unwrap();
		assert_eq!(url.host_str(), Some("api.example"));
	}

	#[test]
	fn relative_source_without_base_is_rejected() {
		assert_eq!(
			resolve_source("lineage.json", None),
			Err(LineageError::InvalidSource("lineage.json".into()))
		);
	}

	#[test]
	fn malformed_body_is_a_decode_error() {
		assert!(matches!(parse_lineage("{\"rootNode\": 3}"), Err(LineageError::Decode(_))));
	}

	#[test]
	fn inconsistent_tree_is_rejected() {
		let body = r#"{
			"rootNode": {
				"id": "a", "type": "original", "title": "A",
				"metadata": { "createdAt": "2024-01-01T00:00:00Z" },
				"children": [
					{ "id": "b", "type": "version", "title": "B", "metadata": { "createdAt": "2024-01-02T00:00:00Z" } },
					{ "id": "b", "type": "variant", "title": "B again", "metadata": { "createdAt": "2024-01-03T00:00:00Z" } }
				]
			},
			"totalNodes": 3, "totalBranches": 2, "maxDepth": 1
		}"#;
		assert_eq!(parse_lineage(body), Err(LineageError::DuplicateId("b".into())));
	}
}
