//! S3 website endpoints

/// Regions whose website endpoint uses `s3-website-<region>` instead of
/// `s3-website.<region>`
const DASH_ENDPOINT_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "eu-west-1",
    "sa-east-1",
    "us-gov-west-1",
];

/// Public website URL of a bucket
pub fn website_endpoint(bucket: &str, region: &str) -> String {
    if DASH_ENDPOINT_REGIONS.contains(&region) {
        format!("http://{}.s3-website-{}.amazonaws.com/", bucket, region)
    } else {
        format!("http://{}.s3-website.{}.amazonaws.com/", bucket, region)
    }
}
