use std::sync::Arc;

use log::info;
use serde::Serialize;
use serde_json::{Map, Value};

use super::request_body;
use crate::creation::{CreatedResource, create, server_validation};
use crate::endpoint::{Endpoint, encode_segment};
use crate::error::Result;
use crate::paginate::{PageRequest, paginate};
use crate::transport::{Body, Params, Transport};

/// Persons known to the account (`/person`).
pub struct Person {
    endpoint: Endpoint,
}

/// Person attributes for [`Person::create`] and [`Person::update`]. Unset
/// optional attributes are left out of the request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDetails {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_type: Option<String>,
    #[serde(rename = "organizationId")]
    pub org_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secondary_emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eppn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upn: Option<String>,
    #[serde(skip)]
    pub extra: Map<String, Value>,
}

impl Person {
    pub const SERVICE: &'static str = "/person";

    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self::with_api_version(transport, base_url, "v1")
    }

    pub fn with_api_version(transport: Arc<dyn Transport>, base_url: &str, version: &str) -> Self {
        Self {
            endpoint: Endpoint::new(transport, base_url, Self::SERVICE, version),
        }
    }

    pub fn list<'a>(
        &'a self,
        filter: &'a Params,
        start: PageRequest,
    ) -> impl Iterator<Item = Result<Value>> + 'a {
        paginate(start, move |page| {
            let mut params = page.params();
            params.extend(filter.iter().cloned());
            self.endpoint
                .transport()
                .get(self.endpoint.api_url(), params)?
                .json::<Vec<Value>>()
        })
    }

    /// Looks a person up by e-mail address.
    pub fn find(&self, email: &str) -> Result<Value> {
        let url = self.endpoint.url(&["id", "byEmail", &encode_segment(email)]);
        self.endpoint.transport().get(&url, Vec::new())?.json()
    }

    pub fn get(&self, person_id: u64) -> Result<Value> {
        let url = self.endpoint.url(&[&person_id.to_string()]);
        self.endpoint.transport().get(&url, Vec::new())?.json()
    }

    pub fn create(&self, person: &PersonDetails) -> Result<CreatedResource> {
        let body = request_body(person, &person.extra)?;
        create(self.endpoint.transport(), self.endpoint.api_url(), body, "Person")
    }

    pub fn update(&self, person_id: u64, person: &PersonDetails) -> Result<()> {
        let body = request_body(person, &person.extra)?;
        let url = self.endpoint.url(&[&person_id.to_string()]);
        self.endpoint
            .transport()
            .put(&url, Body::Json(body))
            .map_err(server_validation)?;
        info!("[person] updated person {person_id}");
        Ok(())
    }

    pub fn delete(&self, person_id: u64) -> Result<()> {
        let url = self.endpoint.url(&[&person_id.to_string()]);
        self.endpoint.transport().delete(&url, Body::Empty)?;
        info!("[person] deleted person {person_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BASE_URL, ScriptedTransport, param};
    use crate::transport::{Method, Response};
    use serde_json::json;

    fn person(transport: &Arc<ScriptedTransport>) -> Person {
        Person::new(transport.clone(), BASE_URL)
    }

    fn jane() -> PersonDetails {
        PersonDetails {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            org_id: 4,
            ..Default::default()
        }
    }

    #[test]
    fn find_percent_encodes_email() {
        let transport = ScriptedTransport::shared();
        transport.push_json(200, json!({"personId": 12}));

        let found = person(&transport).find("jane doe+x@example.com").unwrap();

        assert_eq!(found["personId"], 12);
        assert_eq!(
            transport.last_request().url,
            format!("{BASE_URL}/person/v1/id/byEmail/jane%20doe%2Bx%40example.com")
        );
    }

    #[test]
    fn list_pages_with_filter() {
        let transport = ScriptedTransport::shared();
        transport.push_json(200, json!([{"id": 1}, {"id": 2}]));
        transport.push_json(200, json!([]));
        let person = person(&transport);
        let filter = vec![("organizationId".to_string(), "4".to_string())];

        let people: Vec<Value> = person
            .list(&filter, PageRequest::new(2, 0))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(people.len(), 2);
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(param(&requests[1], "position"), Some("2"));
        assert_eq!(param(&requests[1], "organizationId"), Some("4"));
    }

    #[test]
    fn create_omits_unset_attributes() {
        let transport = ScriptedTransport::shared();
        transport.push(
            Response::new(201).with_header("Location", format!("{BASE_URL}/person/v1/99")),
        );

        let created = person(&transport).create(&jane()).unwrap();

        assert_eq!(created.id, 99);
        assert_eq!(
            transport.last_request().json(),
            Some(&json!({
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane@example.com",
                "organizationId": 4
            }))
        );
    }

    #[test]
    fn update_and_delete_address_the_person() {
        let transport = ScriptedTransport::shared();
        transport.push(Response::new(200));
        transport.push(Response::new(200));
        let person = person(&transport);

        let mut details = jane();
        details.phone = Some("+1 555 0100".to_string());
        details.extra.insert("customAttr".to_string(), json!("x"));
        person.update(12, &details).unwrap();
        person.delete(12).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].url, format!("{BASE_URL}/person/v1/12"));
        let body = requests[0].json().unwrap();
        assert_eq!(body["email"], "jane@example.com");
        assert_eq!(body["phone"], "+1 555 0100");
        assert_eq!(body["customAttr"], "x");
        assert_eq!(requests[1].method, Method::Delete);
    }
}
