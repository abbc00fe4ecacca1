use chrono::{TimeZone, Utc};
use imbo_client::ImboClient;
use imbo_core::transformation::Thumbnail;
use imbo_core::{ClientConfig, Credentials, ImagesQuery, ImboError};

fn client_for_user(user: Option<&str>) -> ImboClient {
    let creds = Credentials::new("pub", "priv", user.map(str::to_string)).unwrap();
    let config = ClientConfig::new(&["http://imbo"], creds).unwrap();
    ImboClient::new(config).unwrap()
}

fn client() -> ImboClient {
    client_for_user(None)
}

#[test]
fn test_image_url_from_client_matches_scenario() {
    let client = client();
    let mut url = client
        .image_url("61da9892205a0d5077a353eb3487e8c8")
        .unwrap();
    url.flip_vertically()
        .max_size(Some(123), Some(456))
        .unwrap()
        .border(imbo_core::transformation::Border::with_color("#bf1942"));

    assert!(url
        .url()
        .ends_with("&accessToken=02a5af1bc197e03d3a226878a8181880d01c2e9ac1a380da0550dccb0519f07e"));
}

#[test]
fn test_image_urls_are_independent() {
    let client = client();
    let mut a = client.image_url("abc").unwrap();
    let b = client.image_url("abc").unwrap();
    a.thumbnail(Thumbnail::default());
    assert_eq!(a.transformations().len(), 1);
    assert!(b.transformations().is_empty());
}

#[test]
fn test_images_url_with_query() {
    let client = client();
    let query = ImagesQuery::new().limit(5).ids(["abc", "def"]);
    let url = client.images_url(Some(&query)).unwrap();
    assert_eq!(
        url.raw_url(),
        "http://imbo/users/pub/images?page=1&limit=5&ids[]=abc&ids[]=def"
    );
    assert!(url
        .url()
        .starts_with("http://imbo/users/pub/images?page=1&limit=5&ids%5B%5D=abc&ids%5B%5D=def&accessToken="));
}

#[test]
fn test_resource_paths() {
    let client = client_for_user(Some("espen"));
    assert_eq!(client.user_url().unwrap().raw_url(), "http://imbo/users/espen?publicKey=pub");
    assert_eq!(client.status_url().unwrap().path(), "/status");
    assert_eq!(client.stats_url().unwrap().path(), "/stats");
    assert_eq!(client.groups_url().unwrap().path(), "/groups");
    assert_eq!(client.group_url("thumbs").unwrap().path(), "/groups/thumbs");
    assert_eq!(client.key_url("other").unwrap().path(), "/keys/other");
    assert_eq!(
        client.metadata_url("abc").unwrap().path(),
        "/users/espen/images/abc/metadata"
    );
}

#[test]
fn test_signed_metadata_url() {
    let client = client();
    let timestamp = Utc.timestamp_millis_opt(1349268217000).unwrap();
    let signed = client.signed_resource_url(
        "PUT",
        "/images/61da9892205a0d5077a353eb3487e8c8/meta",
        &timestamp,
    );
    assert!(signed.contains(
        "signature=afd4c4de76a95d5ed5c23a908278cab40817012a5a5c750d971177d3cba97bf5"
    ));
    assert!(signed.ends_with("&timestamp=2012-10-03T12%3A43%3A37Z"));
}

#[test]
fn test_signed_url_with_delegated_user() {
    let client = client_for_user(Some("espen"));
    let timestamp = Utc.timestamp_millis_opt(1349268217000).unwrap();
    let url = client.metadata_url("abc").unwrap();
    let signed = url.signed_url("PUT", &timestamp);
    assert!(signed.starts_with(
        "http://imbo/users/espen/images/abc/metadata?publicKey=pub&signature="
    ));
}

#[test]
fn test_empty_hosts_rejected() {
    let creds = Credentials::new("pub", "priv", None).unwrap();
    assert!(matches!(
        ClientConfig::new(&[], creds),
        Err(ImboError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_host_selection_is_stable() {
    let creds = Credentials::new("pub", "priv", None).unwrap();
    let config = ClientConfig::new(&["imbo1", "imbo2", "imbo3"], creds).unwrap();
    let client = ImboClient::new(config).unwrap();
    let id = "61da9892205a0d5077a353eb3487e8c8";
    let host = client.host_for_image_identifier(id).to_string();
    for _ in 0..5 {
        assert_eq!(client.host_for_image_identifier(id), host);
    }
    assert!(client.image_url(id).unwrap().url().starts_with(&host));
}
