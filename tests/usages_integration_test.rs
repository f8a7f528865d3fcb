//! Tests for finding the RPCs that reach a type

use protoindex::{ProtoIndexer, UsageContext};
use std::fs;
use tempfile::TempDir;

fn indexer_for(files: &[(&str, &str)]) -> (TempDir, ProtoIndexer) {
    let temp_dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(temp_dir.path().join(name), contents).unwrap();
    }
    let indexer = ProtoIndexer::default();
    indexer.index_directory(temp_dir.path()).unwrap();
    (temp_dir, indexer)
}

#[test]
fn test_direct_usage_has_empty_path() {
    let (_dir, indexer) = indexer_for(&[(
        "user.proto",
        r#"
package api.v1;
service UserService { rpc GetUser(GetUserRequest) returns (User); }
message User { int64 id = 1; }
message GetUserRequest { int64 user_id = 1; }
"#,
    )]);

    let usages = indexer.find_type_usages("User").unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].service, "UserService");
    assert_eq!(usages[0].rpc, "GetUser");
    assert_eq!(usages[0].context, UsageContext::Response);
    assert_eq!(usages[0].depth, 0);
    assert!(usages[0].field_path.is_empty());
}

#[test]
fn test_nested_usage_reports_field_path() {
    let (_dir, indexer) = indexer_for(&[
        (
            "service.proto",
            "package api.v1;\nservice ProductService { rpc GetProduct(GetProductRequest) returns (GetProductResponse); }\n",
        ),
        (
            "types.proto",
            r#"
package api.v1;
message Price { string amount = 1; string currency_code = 2; }
message Product { int64 id = 1; Price price = 3; }
message GetProductRequest { int64 product_id = 1; }
message GetProductResponse { Product product = 1; }
"#,
        ),
    ]);

    let usages = indexer.find_type_usages("Price").unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].field_path, ["product", "price"]);
    assert_eq!(usages[0].depth, 2);
    assert_eq!(usages[0].context, UsageContext::Response);
}

#[test]
fn test_usages_across_services() {
    let (_dir, indexer) = indexer_for(&[
        (
            "service.proto",
            r#"
package api.v1;
service UserService {
  rpc GetUser(GetUserRequest) returns (User);
  rpc CreateUser(CreateUserRequest) returns (User);
}
service CompanyService {
  rpc GetCompany(GetCompanyRequest) returns (Company);
}
message GetUserRequest { int64 id = 1; }
message GetCompanyRequest { int64 id = 1; }
"#,
        ),
        (
            "types.proto",
            r#"
package api.v1;
message Address { string street = 1; string city = 2; }
message User { int64 id = 1; Address address = 3; }
message Company { int64 id = 1; Address headquarters = 3; }
message CreateUserRequest { string name = 1; Address address = 2; }
"#,
        ),
    ]);

    let usages = indexer.find_type_usages("Address").unwrap();
    let summary: Vec<(&str, &str, UsageContext, Vec<String>)> = usages
        .iter()
        .map(|u| (u.service.as_str(), u.rpc.as_str(), u.context, u.field_path.clone()))
        .collect();

    assert_eq!(
        summary,
        [
            ("UserService", "GetUser", UsageContext::Response, vec!["address".to_string()]),
            ("UserService", "CreateUser", UsageContext::Request, vec!["address".to_string()]),
            ("UserService", "CreateUser", UsageContext::Response, vec!["address".to_string()]),
            ("CompanyService", "GetCompany", UsageContext::Response, vec!["headquarters".to_string()]),
        ]
    );
}

#[test]
fn test_usages_through_qualified_cross_package_types() {
    let (_dir, indexer) = indexer_for(&[
        (
            "shared_types.proto",
            r#"
package acme.dto.checkout.v1beta1;
message ProductReference { int64 product_id = 1; string product_type = 2; }
message Price { string amount = 1; }
"#,
        ),
        (
            "tax.proto",
            r#"
package acme.rpc.checkout.info.v1beta1;

service TaxInfoService {
  rpc CalculateTaxInfo(CalculateTaxInfoRequest) returns (CalculateTaxInfoResponse);
}

message TaxableLine {
  acme.dto.checkout.v1beta1.ProductReference product_reference = 1;
  acme.dto.checkout.v1beta1.Price unit_net_price = 2;
}

message TaxedLine {
  acme.dto.checkout.v1beta1.ProductReference product_reference = 1;
  int64 quantity = 2;
}

message CalculateTaxInfoRequest { repeated TaxableLine taxable_lines = 1; }
message CalculateTaxInfoResponse { repeated TaxedLine taxed_lines = 1; }
"#,
        ),
    ]);

    let usages = indexer.find_type_usages("ProductReference").unwrap();
    assert_eq!(usages.len(), 2);
    assert_eq!(usages[0].context, UsageContext::Request);
    assert_eq!(usages[0].field_path, ["taxable_lines", "product_reference"]);
    assert_eq!(usages[1].context, UsageContext::Response);
    assert_eq!(usages[1].field_path, ["taxed_lines", "product_reference"]);
    assert_eq!(
        usages[0].service_full_name,
        "acme.rpc.checkout.info.v1beta1.TaxInfoService"
    );
}

#[test]
fn test_enum_usage_and_unknown_type() {
    let (_dir, indexer) = indexer_for(&[(
        "orders.proto",
        r#"
package shop;
service Orders { rpc Get(GetOrder) returns (Order); }
message GetOrder { string id = 1; }
message Order { Status status = 1; }
enum Status { OPEN = 0; CLOSED = 1; }
enum Unused { NONE = 0; }
"#,
    )]);

    let usages = indexer.find_type_usages("shop.Status").unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].field_path, ["status"]);

    assert!(indexer.find_type_usages("Unused").unwrap().is_empty());
    assert!(indexer.find_type_usages("DoesNotExist").is_none());
}
