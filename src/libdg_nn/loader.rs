// Copyright 2019 Karl Sundequist Blomdahl <karl.sundequist.blomdahl@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Parses the model container format: an 8-byte magic, three little-endian
// 64-bit integers (version, total file size, metadata length), a JSON
// metadata blob, and then the backend-specific model bytes. This module only
// understands the header -- the backend bytes are handed back unparsed since
// interpreting them is a concrete backend's job, out of scope here.

use crate::error::NnError;
use serde::Deserialize;

const MAGIC: &[u8; 8] = b"<minigo>";
const SUPPORTED_VERSION: u64 = 1;
const HEADER_LEN: usize = 8 + 8 + 8 + 8;

#[derive(Deserialize, Clone, Debug)]
pub struct ModelMetadata {
    pub engine: String,
    pub input_features: String,
    pub input_layout: String,
    pub board_size: u32
}

pub struct ParsedModel<'a> {
    pub metadata: ModelMetadata,
    pub backend_bytes: &'a [u8]
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64, NnError> {
    bytes
        .get(offset..offset + 8)
        .and_then(|slice| slice.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| NnError::MalformedModel("truncated header".to_string()))
}

/// Parses the container header out of `bytes`, returning the decoded
/// metadata and a slice over the remaining backend-specific bytes.
pub fn parse(bytes: &[u8]) -> Result<ParsedModel<'_>, NnError> {
    if bytes.len() < HEADER_LEN {
        return Err(NnError::MalformedModel("file shorter than header".to_string()));
    }

    if &bytes[0..8] != MAGIC {
        return Err(NnError::MalformedModel("bad magic".to_string()));
    }

    let version = read_u64(bytes, 8)?;
    if version != SUPPORTED_VERSION {
        return Err(NnError::MalformedModel(format!("unsupported version {}", version)));
    }

    let total_size = read_u64(bytes, 16)? as usize;
    let metadata_len = read_u64(bytes, 24)? as usize;

    if total_size != bytes.len() {
        return Err(NnError::MalformedModel(format!(
            "declared size {} does not match actual size {}",
            total_size,
            bytes.len()
        )));
    }

    let metadata_start = HEADER_LEN;
    let metadata_end = metadata_start
        .checked_add(metadata_len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| NnError::MalformedModel("metadata length overruns file".to_string()))?;

    let metadata: ModelMetadata = serde_json::from_slice(&bytes[metadata_start..metadata_end])
        .map_err(|e| NnError::MalformedModel(format!("invalid metadata json: {}", e)))?;

    if crate::model::FeatureLayout::parse(&metadata.input_layout).is_none() {
        return Err(NnError::MalformedModel(format!("unknown input_layout: {}", metadata.input_layout)));
    }

    debug!("parsed model container: engine={} board_size={}", metadata.engine, metadata.board_size);

    Ok(ParsedModel {
        metadata,
        backend_bytes: &bytes[metadata_end..]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_container(metadata_json: &str, backend_bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&SUPPORTED_VERSION.to_le_bytes());

        let total_size = HEADER_LEN + metadata_json.len() + backend_bytes.len();
        out.extend_from_slice(&(total_size as u64).to_le_bytes());
        out.extend_from_slice(&(metadata_json.len() as u64).to_le_bytes());
        out.extend_from_slice(metadata_json.as_bytes());
        out.extend_from_slice(backend_bytes);

        out
    }

    #[test]
    fn parses_a_well_formed_container() {
        let metadata = r#"{"engine":"tf","input_features":"agz","input_layout":"nhwc","board_size":19}"#;
        let bytes = build_container(metadata, &[1, 2, 3, 4]);

        let parsed = parse(&bytes).unwrap();

        assert_eq!(parsed.metadata.engine, "tf");
        assert_eq!(parsed.metadata.board_size, 19);
        assert_eq!(parsed.backend_bytes, &[1, 2, 3, 4]);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = build_container(r#"{"engine":"tf","input_features":"agz","input_layout":"nhwc","board_size":9}"#, &[]);
        bytes[0] = b'x';

        assert!(parse(&bytes).is_err());
    }

    #[test]
    fn rejects_mismatched_total_size() {
        let mut bytes = build_container(r#"{"engine":"tf","input_features":"agz","input_layout":"nhwc","board_size":9}"#, &[]);
        bytes.push(0xff); // pad the file without updating the declared size.

        assert!(parse(&bytes).is_err());
    }

    #[test]
    fn rejects_unknown_layout() {
        let bytes = build_container(r#"{"engine":"tf","input_features":"agz","input_layout":"weird","board_size":9}"#, &[]);

        assert!(parse(&bytes).is_err());
    }
}
