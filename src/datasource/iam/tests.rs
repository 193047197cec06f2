//! Tests for the IAM datasource

use super::*;
use crate::adapter::{Adapter, AdapterRegistry};
use crate::auth::AuthCredentials;
use crate::config::AdapterConfig;
use crate::cursor::{self, AccountCursor, CompositeCursor};
use crate::decode::{AttributeConfig, AttributeType, AttributeValue, EntityConfig};
use crate::engine::{DatasourceConfig, GetPageRequest, GetPageResponse};
use crate::error::{Error, ErrorCode, Result};
use crate::pagination::{slice_page, Credentials, ListPage, RoleAssumer};
use crate::types::JsonObject;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// Fake SDK
// ============================================================================

fn object(value: Value) -> JsonObject {
    value.as_object().cloned().unwrap()
}

/// One account's IAM contents. Markers are decimal offsets.
#[derive(Default)]
struct FakeIam {
    account: String,
    users: Vec<String>,
    groups: Vec<(String, Vec<String>)>,
    roles: Vec<String>,
    policies: Vec<String>,
    providers: Vec<String>,
    attached: HashMap<String, Vec<String>>,
}

impl FakeIam {
    fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
            ..Default::default()
        }
    }

    fn arn(&self, kind: &str, name: &str) -> String {
        format!("arn:aws:iam::{}:{kind}/{name}", self.account)
    }

    fn attached_policies(&self, owner: &str, marker: Option<&str>, max: usize) -> Result<ListPage> {
        let policies = self
            .attached
            .get(owner)
            .ok_or_else(|| Error::vendor(Some(404), format!("{owner} not found")))?;
        let objects = policies
            .iter()
            .map(|p| object(json!({"PolicyArn": self.arn("policy", p), "PolicyName": p})))
            .collect();
        slice_page(objects, marker, max)
    }
}

#[async_trait]
impl IamApi for FakeIam {
    async fn list_users(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage> {
        let objects = self
            .users
            .iter()
            .map(|u| object(json!({"UserName": u})))
            .collect();
        slice_page(objects, marker, max_items)
    }

    async fn list_groups(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage> {
        let objects = self
            .groups
            .iter()
            .map(|(g, _)| object(json!({"GroupName": g, "Arn": self.arn("group", g)})))
            .collect();
        slice_page(objects, marker, max_items)
    }

    async fn list_roles(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage> {
        let objects = self
            .roles
            .iter()
            .map(|r| object(json!({"RoleName": r})))
            .collect();
        slice_page(objects, marker, max_items)
    }

    async fn list_policies(&self, marker: Option<&str>, max_items: usize) -> Result<ListPage> {
        let objects = self
            .policies
            .iter()
            .map(|p| object(json!({"Arn": self.arn("policy", p), "PolicyName": p})))
            .collect();
        slice_page(objects, marker, max_items)
    }

    async fn list_identity_providers(&self) -> Result<Vec<JsonObject>> {
        Ok(self
            .providers
            .iter()
            .map(|p| object(json!({"Arn": self.arn("saml-provider", p)})))
            .collect())
    }

    async fn get_user(&self, user_name: &str) -> Result<JsonObject> {
        if user_name == "broken" {
            return Err(Error::vendor(Some(500), "GetUser failed"));
        }
        Ok(object(json!({
            "UserName": user_name,
            "Arn": self.arn("user", user_name),
            "CreateDate": "2024-03-01T10:00:00Z"
        })))
    }

    async fn get_role(&self, role_name: &str) -> Result<JsonObject> {
        Ok(object(json!({
            "RoleName": role_name,
            "Arn": self.arn("role", role_name),
            "RoleLastUsed": {"Region": "us-east-1"}
        })))
    }

    async fn list_group_members(
        &self,
        group_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage> {
        let (_, members) = self
            .groups
            .iter()
            .find(|(g, _)| g == group_name)
            .ok_or_else(|| Error::vendor(Some(404), format!("group {group_name} not found")))?;
        let objects = members
            .iter()
            .map(|u| object(json!({"UserName": u})))
            .collect();
        slice_page(objects, marker, max_items)
    }

    async fn list_attached_group_policies(
        &self,
        group_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage> {
        self.attached_policies(group_name, marker, max_items)
    }

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage> {
        self.attached_policies(role_name, marker, max_items)
    }

    async fn list_attached_user_policies(
        &self,
        user_name: &str,
        marker: Option<&str>,
        max_items: usize,
    ) -> Result<ListPage> {
        self.attached_policies(user_name, marker, max_items)
    }
}

/// Clients keyed by access key id; assumed roles use the role ARN as key id
#[derive(Default)]
struct FakeFactory {
    accounts: HashMap<String, Arc<FakeIam>>,
    assumed: Arc<Mutex<Vec<String>>>,
}

impl FakeFactory {
    fn with(mut self, access_key_id: &str, iam: FakeIam) -> Self {
        self.accounts.insert(access_key_id.to_string(), Arc::new(iam));
        self
    }
}

struct FakeAssumer {
    assumed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RoleAssumer for FakeAssumer {
    async fn assume_role(&self, role_arn: &str) -> Result<Credentials> {
        self.assumed.lock().unwrap().push(role_arn.to_string());
        Ok(Credentials {
            access_key_id: role_arn.to_string(),
            secret_access_key: "assumed".to_string(),
            session_token: Some("token".to_string()),
            expiration: None,
        })
    }
}

#[async_trait]
impl IamClientFactory for FakeFactory {
    async fn client(&self, _region: &str, credentials: &Credentials) -> Result<Arc<dyn IamApi>> {
        let iam = self
            .accounts
            .get(&credentials.access_key_id)
            .ok_or_else(|| Error::auth(format!("unknown key {}", credentials.access_key_id)))?;
        Ok(Arc::clone(iam) as Arc<dyn IamApi>)
    }

    async fn role_assumer(
        &self,
        _region: &str,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn RoleAssumer>> {
        Ok(Arc::new(FakeAssumer {
            assumed: Arc::clone(&self.assumed),
        }))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn adapter(factory: FakeFactory) -> IamAdapter {
    IamAdapter::new(Arc::new(AdapterConfig::default()), Arc::new(factory)).unwrap()
}

fn entity(external_id: &str, attributes: Vec<AttributeConfig>) -> EntityConfig {
    EntityConfig {
        id: external_id.to_lowercase(),
        external_id: external_id.to_string(),
        attributes,
        child_entities: Vec::new(),
    }
}

fn group_member_entity() -> EntityConfig {
    entity(
        "GroupMember",
        vec![
            AttributeConfig::new("id", "id", AttributeType::String).unique(),
            AttributeConfig::new("user", "UserName", AttributeType::String),
            AttributeConfig::new("group", "GroupName", AttributeType::String),
        ],
    )
}

fn arn_entity(external_id: &str) -> EntityConfig {
    entity(
        external_id,
        vec![AttributeConfig::new("arn", "Arn", AttributeType::String).unique()],
    )
}

fn request(entity: EntityConfig, config: Value, page_size: usize, cursor: &str) -> GetPageRequest {
    GetPageRequest {
        datasource: DatasourceConfig {
            id: "iam".to_string(),
            datasource_type: DATASOURCE_TYPE.to_string(),
            address: String::new(),
            auth: Some(AuthCredentials::AccessKey {
                access_key_id: "base".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: None,
            }),
            config,
        },
        entity,
        page_size,
        cursor: cursor.to_string(),
    }
}

fn single_account() -> Value {
    json!({"region": "us-east-1"})
}

fn ids(response: &GetPageResponse, attribute: &str) -> Vec<String> {
    response
        .objects
        .iter()
        .map(|o| match o.get(attribute) {
            Some(AttributeValue::String(s)) => s.clone(),
            other => panic!("unexpected {attribute}: {other:?}"),
        })
        .collect()
}

fn decode(cursor: &str) -> CompositeCursor {
    cursor::unmarshal(cursor).unwrap().unwrap()
}

/// Drain a sync, returning every page
async fn drain(adapter: &IamAdapter, mut request: GetPageRequest) -> Vec<GetPageResponse> {
    let mut pages = Vec::new();
    loop {
        let page = adapter.get_page(&request).await.unwrap();
        let done = page.is_last();
        request.cursor = page.next_cursor.clone();
        pages.push(page);
        if done || pages.len() > 50 {
            return pages;
        }
    }
}

// ============================================================================
// Two-level Paging
// ============================================================================

#[tokio::test]
async fn test_group_members_two_level() {
    let mut iam = FakeIam::new("111");
    iam.groups = vec![
        ("Group1".into(), vec!["user1".into(), "user2".into(), "user3".into()]),
        ("Group2".into(), vec!["user1".into(), "user2".into()]),
        ("Group3".into(), vec![]),
        ("Group4".into(), vec!["user9".into()]),
    ];
    let adapter = adapter(FakeFactory::default().with("base", iam));

    let first = adapter
        .get_page(&request(group_member_entity(), single_account(), 2, ""))
        .await
        .unwrap();
    assert_eq!(ids(&first, "id"), vec!["user1-Group1", "user2-Group1"]);
    assert_eq!(
        decode(&first.next_cursor),
        CompositeCursor {
            cursor: Some("2".to_string()),
            collection_id: Some("Group1".to_string()),
            collection_cursor: Some("1".to_string()),
        }
    );

    let pages = drain(&adapter, request(group_member_entity(), single_account(), 2, "")).await;
    let per_page: Vec<Vec<String>> = pages.iter().map(|p| ids(p, "id")).collect();
    assert_eq!(
        per_page,
        vec![
            vec!["user1-Group1".to_string(), "user2-Group1".to_string()],
            vec!["user3-Group1".to_string()],
            vec!["user1-Group2".to_string(), "user2-Group2".to_string()],
            vec![],
            vec!["user9-Group4".to_string()],
        ]
    );

    assert_eq!(
        decode(&pages[2].next_cursor),
        CompositeCursor::with_collection_cursor("2".to_string())
    );
    // The member-less group still hands back a cursor
    assert!(!pages[3].is_last());
    assert!(pages[4].is_last());
    assert_eq!(
        ids(&pages[0], "group"),
        vec!["Group1".to_string(), "Group1".to_string()]
    );
}

#[tokio::test]
async fn test_attached_role_policies() {
    let mut iam = FakeIam::new("111");
    iam.roles = vec!["admin".into(), "reader".into()];
    iam.attached.insert("admin".into(), vec!["AdministratorAccess".into()]);
    iam.attached.insert("reader".into(), vec!["ReadOnlyAccess".into()]);
    let adapter = adapter(FakeFactory::default().with("base", iam));

    let entity = entity(
        "RolePolicy",
        vec![
            AttributeConfig::new("id", "id", AttributeType::String).unique(),
            AttributeConfig::new("role", "RoleName", AttributeType::String),
        ],
    );
    let pages = drain(&adapter, request(entity, single_account(), 10, "")).await;
    let all: Vec<String> = pages.iter().flat_map(|p| ids(p, "id")).collect();

    assert_eq!(
        all,
        vec![
            "arn:aws:iam::111:policy/AdministratorAccess-admin",
            "arn:aws:iam::111:policy/ReadOnlyAccess-reader",
        ]
    );
}

// ============================================================================
// Single Collection Paging
// ============================================================================

#[tokio::test]
async fn test_policy_cursor_wraps_vendor_marker() {
    let mut iam = FakeIam::new("111");
    iam.policies = (1..=5).map(|i| format!("p{i}")).collect();
    let adapter = adapter(FakeFactory::default().with("base", iam));

    let pages = drain(&adapter, request(arn_entity("Policy"), single_account(), 2, "")).await;

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].next_cursor, STANDARD.encode(r#"{"cursor":"2"}"#));
    assert_eq!(pages[1].next_cursor, STANDARD.encode(r#"{"cursor":"4"}"#));
    assert_eq!(pages[2].next_cursor, "");
    assert_eq!(
        ids(&pages[2], "arn"),
        vec!["arn:aws:iam::111:policy/p5".to_string()]
    );
}

#[tokio::test]
async fn test_empty_collection_ends_immediately() {
    let adapter = adapter(FakeFactory::default().with("base", FakeIam::new("111")));

    let page = adapter
        .get_page(&request(arn_entity("Policy"), single_account(), 2, ""))
        .await
        .unwrap();
    assert!(page.objects.is_empty());
    assert!(page.is_last());
}

#[tokio::test]
async fn test_identity_providers_are_sliced() {
    let mut iam = FakeIam::new("111");
    iam.providers = vec!["okta".into(), "azure".into(), "google".into()];
    let adapter = adapter(FakeFactory::default().with("base", iam));

    let pages = drain(
        &adapter,
        request(arn_entity("IdentityProvider"), single_account(), 2, ""),
    )
    .await;

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].next_cursor, STANDARD.encode(r#"{"cursor":"2"}"#));
    assert_eq!(pages[1].objects.len(), 1);
}

#[tokio::test]
async fn test_users_are_fetched_in_detail() {
    let mut iam = FakeIam::new("111");
    iam.users = vec!["alice".into(), "bob".into(), "carol".into()];
    let adapter = adapter(FakeFactory::default().with("base", iam));

    let entity = entity(
        "User",
        vec![
            AttributeConfig::new("name", "UserName", AttributeType::String).unique(),
            AttributeConfig::new("arn", "Arn", AttributeType::String),
            AttributeConfig::new("created", "CreateDate", AttributeType::DateTime),
        ],
    );
    let page = adapter
        .get_page(&request(entity, single_account(), 10, ""))
        .await
        .unwrap();

    assert_eq!(
        ids(&page, "arn"),
        vec![
            "arn:aws:iam::111:user/alice",
            "arn:aws:iam::111:user/bob",
            "arn:aws:iam::111:user/carol",
        ]
    );
    assert!(matches!(
        page.objects[0].get("created"),
        Some(AttributeValue::DateTime(_))
    ));
}

#[tokio::test]
async fn test_failed_detail_fails_the_page() {
    let mut iam = FakeIam::new("111");
    iam.users = vec!["alice".into(), "broken".into()];
    let adapter = adapter(FakeFactory::default().with("base", iam));

    let entity = entity(
        "User",
        vec![AttributeConfig::new("name", "UserName", AttributeType::String).unique()],
    );
    let err = adapter
        .get_page(&request(entity, single_account(), 10, ""))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.code(), ErrorCode::Internal);
}

// ============================================================================
// Resource Accounts
// ============================================================================

fn roles(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("arn:aws:iam::{i}00:role/Reader"))
        .collect()
}

#[tokio::test]
async fn test_accounts_are_visited_in_order() {
    let roles = roles(3);
    let mut factory = FakeFactory::default();
    for (i, role) in roles.iter().enumerate() {
        let mut iam = FakeIam::new(&format!("{i}00"));
        iam.policies = vec!["a".into(), "b".into(), "c".into()];
        factory = factory.with(role, iam);
    }
    let assumed = Arc::clone(&factory.assumed);
    let adapter = adapter(factory);

    let config = json!({"region": "us-east-1", "resourceAccountRoles": roles});
    let pages = drain(&adapter, request(arn_entity("Policy"), config, 2, "")).await;

    assert_eq!(pages.len(), 6);
    assert_eq!(
        *assumed.lock().unwrap(),
        vec![
            roles[0].clone(),
            roles[0].clone(),
            roles[1].clone(),
            roles[1].clone(),
            roles[2].clone(),
            roles[2].clone(),
        ]
    );

    let first = decode(&pages[0].next_cursor);
    let account: AccountCursor = cursor::unmarshal(first.cursor.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(account, AccountCursor::new(0, Some("2".to_string())));

    let second = decode(&pages[1].next_cursor);
    let account: AccountCursor = cursor::unmarshal(second.cursor.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(account, AccountCursor::new(1, None));

    let arns: Vec<String> = pages.iter().flat_map(|p| ids(p, "arn")).collect();
    assert_eq!(arns.len(), 9);
    assert_eq!(arns[0], "arn:aws:iam::000:policy/a");
    assert_eq!(arns[8], "arn:aws:iam::200:policy/c");
    assert!(pages[5].is_last());
}

#[tokio::test]
async fn test_member_entities_across_accounts() {
    let roles = roles(2);
    let mut first = FakeIam::new("000");
    first.groups = vec![
        ("admins".into(), vec!["ann".into()]),
        ("devs".into(), vec!["dan".into(), "dora".into()]),
    ];
    let mut second = FakeIam::new("100");
    second.groups = vec![("admins".into(), vec!["zed".into()])];

    let factory = FakeFactory::default()
        .with(&roles[0], first)
        .with(&roles[1], second);
    let adapter = adapter(factory);

    let config = json!({"region": "us-east-1", "resourceAccountRoles": roles});
    let pages = drain(&adapter, request(group_member_entity(), config, 1, "")).await;
    let per_page: Vec<Vec<String>> = pages.iter().map(|p| ids(p, "id")).collect();

    assert_eq!(
        per_page,
        vec![
            vec!["ann-admins".to_string()],
            vec!["dan-devs".to_string()],
            vec!["dora-devs".to_string()],
            vec!["zed-admins".to_string()],
        ]
    );

    // Mid-group: the account position rides in collectionCursor
    let cursor = decode(&pages[1].next_cursor);
    assert_eq!(cursor.cursor.as_deref(), Some("1"));
    assert_eq!(cursor.collection_id.as_deref(), Some("devs"));
    let account: AccountCursor = cursor::unmarshal(cursor.collection_cursor.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(account, AccountCursor::new(0, None));
}

// ============================================================================
// Request Validation
// ============================================================================

#[tokio::test]
async fn test_invalid_cursor_through_registry() {
    let mut registry = AdapterRegistry::new(Arc::new(AdapterConfig::default()));
    registry
        .register(Arc::new(adapter(
            FakeFactory::default().with("base", FakeIam::new("111")),
        )))
        .unwrap();

    let err = registry
        .handle(&request(arn_entity("Policy"), single_account(), 2, "%%%not-base64"))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidPageRequestConfig);
    assert!(err.message.contains("base64"));
}

#[tokio::test]
async fn test_too_many_resource_accounts() {
    let config = AdapterConfig {
        max_resource_accounts: 2,
        ..Default::default()
    };
    let adapter = IamAdapter::new(Arc::new(config), Arc::new(FakeFactory::default())).unwrap();

    let err = adapter
        .get_page(&request(
            arn_entity("Policy"),
            json!({"region": "us-east-1", "resourceAccountRoles": roles(3)}),
            2,
            "",
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TooManyResourceAccounts { count: 3, max: 2 }));
    assert_eq!(err.code(), ErrorCode::InvalidDatasourceConfig);
}

#[tokio::test]
async fn test_datasource_config_errors() {
    let adapter = adapter(FakeFactory::default().with("base", FakeIam::new("111")));

    let err = adapter
        .get_page(&request(arn_entity("Policy"), json!({}), 2, ""))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidDatasourceConfig);

    let err = adapter
        .get_page(&request(arn_entity("Policy"), json!({"region": 7}), 2, ""))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidDatasourceConfig);

    let mut bearer = request(arn_entity("Policy"), single_account(), 2, "");
    bearer.datasource.auth = Some(AuthCredentials::Bearer {
        token: "t".to_string(),
    });
    let err = adapter.get_page(&bearer).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidDatasourceConfig);
    assert!(err.to_string().contains("bearer"));
}

#[tokio::test]
async fn test_account_offset_out_of_range() {
    let roles = roles(2);
    let adapter = adapter(FakeFactory::default());
    let position = cursor::marshal_string(&AccountCursor::<String>::new(5, None)).unwrap();
    let cursor = cursor::marshal_string(&CompositeCursor::with_cursor(position)).unwrap();

    let err = adapter
        .get_page(&request(
            arn_entity("Policy"),
            json!({"region": "us-east-1", "resourceAccountRoles": roles}),
            2,
            &cursor,
        ))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidPageRequestConfig);
}

#[test]
fn test_entity_table() {
    assert_eq!(
        IamEntity::from_external_id("GroupMember").unwrap(),
        IamEntity::GroupMember
    );
    assert!(IamEntity::from_external_id("Widget").is_err());

    let registry = IamEntity::registry().unwrap();
    assert_eq!(registry.len(), IamEntity::ALL.len());

    let member_of = registry.get("UserPolicy").unwrap().member_of.clone().unwrap();
    assert_eq!(member_of.collection, "User");
    assert_eq!(member_of.collection_unique_attribute, "UserName");
    assert_eq!(member_of.member_unique_attribute, "PolicyArn");
    assert!(registry.get("Policy").unwrap().member_of.is_none());
}
