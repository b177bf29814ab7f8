//! Error types for loading and interpreting lineage data.

use thiserror::Error;

/// Errors raised while fetching, decoding or checking a lineage.
///
/// Layout and rendering are total over a well-formed tree, so nothing in the
/// drawing path returns this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineageError {
	/// The lineage source could not be turned into a request URL
	#[error("invalid lineage source `{0}`")]
	InvalidSource(String),

	/// The request never produced a response
	#[error("request to {url} failed: {message}")]
	Request {
		/// Resolved request URL.
		url: String,
		/// Transport error text.
		message: String,
	},

	/// The backend answered with a non-success status
	#[error("{url} answered with HTTP {status}")]
	Status {
		/// Resolved request URL.
		url: String,
		/// HTTP status code.
		status: u16,
	},

	/// The response body is not a lineage document
	#[error("could not decode lineage: {0}")]
	Decode(String),

	/// Two nodes share an id
	#[error("node id `{0}` appears more than once")]
	DuplicateId(String),

	/// A node's `parentId` disagrees with where it sits in the tree
	#[error("node `{node}` claims parent `{found}` but is a child of `{expected}`")]
	ParentMismatch {
		/// Id of the inconsistent node.
		node: String,
		/// Id of the node it is nested under.
		expected: String,
		/// Id stored in its `parentId`.
		found: String,
	},

	/// A layout mode name that is not tree, radial or timeline
	#[error("unknown layout mode `{0}`")]
	UnknownLayoutMode(String),
}

impl From<serde_json::Error> for LineageError {
	fn from(err: serde_json::Error) -> Self {
		Self::Decode(err.to_string())
	}
}
