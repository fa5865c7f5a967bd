use std::path::Path;

use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_sdk_s3::Client;

/// Endpoint of the OCI Object Storage S3 compatibility API.
///
/// The compatibility API addresses buckets by path under a namespace-scoped host.
pub fn compat_endpoint(namespace: &str, region: &str) -> String {
    format!(
        "https://{}.compat.objectstorage.{}.oraclecloud.com",
        namespace, region
    )
}

/// Create an S3 client for the bucket's object store.
///
/// Credentials resolve through the default AWS provider chain. When
/// `credentials_file` is set it is read as an AWS-style credentials file
/// (OCI "customer secret keys"), and `profile` selects the section.
///
/// Loading never fails here: missing credentials surface as an error on the
/// first request, which lets the listing chain fall through to the next source.
pub async fn create_s3_client(
    endpoint_url: &str,
    region: &str,
    credentials_file: Option<&Path>,
    profile: Option<&str>,
) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region)
        .endpoint_url(endpoint_url);

    if let Some(path) = credentials_file {
        let files = EnvConfigFiles::builder()
            .with_file(EnvConfigFileKind::Credentials, path)
            .include_default_config_file(true)
            .build();
        config_loader = config_loader.profile_files(files);
    }

    if let Some(profile) = profile {
        config_loader = config_loader.profile_name(profile);
    }

    let sdk_config = config_loader.load().await;

    // The compatibility API only supports path-style addressing
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(true)
        .build();

    Client::from_conf(s3_config)
}
