//! Upload of generated artifacts to S3 for static hosting.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use tracing::info;

use crate::output::Artifact;

/// Datasets change on every run, so browsers and CDNs must revalidate.
pub const DATA_CACHE_CONTROL: &str = "no-cache, max-age=0";

/// Object key for `artifact` under `prefix`.
///
/// Gzipped artifacts keep their uncompressed name: the bucket serves them
/// with `Content-Encoding: gzip` so clients decompress transparently.
pub fn object_key(prefix: &str, artifact: &Artifact) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        artifact.name.clone()
    } else {
        format!("{}/{}", prefix, artifact.name)
    }
}

/// Uploads `artifact` as a public-read JSON object.
#[tracing::instrument(skip(client, artifact), fields(name = %artifact.name, gzip = artifact.gzipped))]
pub async fn upload_artifact(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
    artifact: &Artifact,
) -> Result<String> {
    let key = object_key(prefix, artifact);

    let mut request = client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .acl(ObjectCannedAcl::PublicRead)
        .content_type("application/json")
        .cache_control(DATA_CACHE_CONTROL)
        .body(ByteStream::from(artifact.body.clone()));

    if artifact.gzipped {
        request = request.content_encoding("gzip");
    }

    request
        .send()
        .await
        .with_context(|| format!("S3 PutObject failed for s3://{bucket}/{key}"))?;

    info!(bucket, key = %key, bytes = artifact.body.len(), "Uploaded artifact");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(gzipped: bool) -> Artifact {
        Artifact {
            name: "covid_data.json".to_string(),
            body: Vec::new(),
            gzipped,
        }
    }

    #[test]
    fn test_object_key_without_prefix() {
        assert_eq!(object_key("", &artifact(false)), "covid_data.json");
        assert_eq!(object_key("/", &artifact(false)), "covid_data.json");
    }

    #[test]
    fn test_object_key_with_prefix() {
        assert_eq!(object_key("data", &artifact(false)), "data/covid_data.json");
        assert_eq!(object_key("/data/", &artifact(false)), "data/covid_data.json");
    }

    #[test]
    fn test_gzipped_object_keeps_plain_name() {
        assert_eq!(object_key("data", &artifact(true)), "data/covid_data.json");
    }
}
