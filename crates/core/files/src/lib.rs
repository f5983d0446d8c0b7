use floodnet_config::{config, report_internal_error, FilesS3};
use floodnet_result::{create_error, Result};

use aws_sdk_s3::{
    config::{Credentials, Region},
    Client, Config,
};
use nanoid::nanoid;

/// Create an S3 client
pub fn create_client(s3_config: FilesS3) -> Client {
    let provider_name = "floodnet-evidence";
    let creds = Credentials::new(
        s3_config.access_key_id,
        s3_config.secret_access_key,
        None,
        None,
        provider_name,
    );

    let config = Config::builder()
        .region(Region::new(s3_config.region))
        .endpoint_url(s3_config.endpoint)
        .credentials_provider(creds)
        .force_path_style(true)
        .build();

    Client::from_conf(config)
}

/// File extension for an accepted evidence content type
pub fn extension_for(content_type: &str) -> Result<&'static str> {
    match content_type {
        "image/jpeg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        _ => Err(create_error!(FileTypeNotAllowed)),
    }
}

/// Check the buffer actually parses as an image before accepting it
/// as evidence
pub fn validate_image(buf: &[u8]) -> Result<()> {
    imagesize::blob_size(buf)
        .map(|_| ())
        .map_err(|_| create_error!(FileTypeNotAllowed))
}

/// Upload an evidence image to S3, returning its public URL
pub async fn upload_to_s3(buf: &[u8], content_type: &str) -> Result<String> {
    let config = config().await;
    let client = create_client(config.files.s3.clone());

    let key = format!("{}.{}", nanoid!(42), extension_for(content_type)?);

    report_internal_error!(
        client
            .put_object()
            .bucket(&config.files.s3.bucket)
            .key(&key)
            .content_type(content_type)
            .body(buf.to_vec().into())
            .send()
            .await
    )?;

    Ok(format!(
        "{}/{}",
        config.files.s3.public_base_url.trim_end_matches('/'),
        key
    ))
}

/// Delete an evidence object from S3 by its object key
pub async fn delete_from_s3(key: &str) -> Result<()> {
    let config = config().await;
    let client = create_client(config.files.s3.clone());

    report_internal_error!(
        client
            .delete_object()
            .bucket(&config.files.s3.bucket)
            .key(key)
            .send()
            .await
    )?;

    Ok(())
}

/// Recover the object key from a public evidence URL
pub fn key_from_reference(reference: &str) -> Result<String> {
    reference
        .rsplit('/')
        .next()
        .filter(|key| !key.is_empty())
        .map(|key| key.to_string())
        .ok_or_else(|| create_error!(NotFound))
}

#[cfg(test)]
mod tests {
    use crate::{extension_for, key_from_reference, validate_image};

    #[test]
    fn extension_mapping() {
        assert_eq!(extension_for("image/jpeg").unwrap(), "jpg");
        assert_eq!(extension_for("image/png").unwrap(), "png");
        assert!(extension_for("application/pdf").is_err());
    }

    #[test]
    fn key_recovery() {
        assert_eq!(
            key_from_reference("http://127.0.0.1:9000/report-images/abc123.jpg").unwrap(),
            "abc123.jpg"
        );
        assert!(key_from_reference("").is_err());
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(validate_image(b"not an image").is_err());
    }

    #[test]
    fn accepts_png_header() {
        // Minimal PNG: signature + IHDR for a 1x1 image
        let png: &[u8] = &[
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1F, 0x15, 0xC4, 0x89,
        ];
        assert!(validate_image(png).is_ok());
    }
}
