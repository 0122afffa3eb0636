use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const POLICY_VERSION: &str = "2012-10-17";

/// One IAM policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: String,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub resource: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub principal: Option<Value>,
}

impl Statement {
    #[must_use]
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect: "Allow".to_string(),
            action: actions.into_iter().map(Into::into).collect(),
            resource: resources.into_iter().map(Into::into).collect(),
            principal: None,
        }
    }
}

/// IAM policy document
///
/// ```rust
/// use platform_resources::{PolicyDocument, Statement};
///
/// let doc = PolicyDocument::new(vec![Statement::allow(["s3:*"], ["arn:aws:s3:::b"])]);
/// let json = doc.to_value();
/// assert_eq!(json["Version"], "2012-10-17");
/// assert_eq!(json["Statement"][0]["Action"][0], "s3:*");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    #[must_use]
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }

    /// Trust policy letting an AWS service principal assume a role.
    #[must_use]
    pub fn assume_role(service_principal: &str) -> Self {
        Self::new(vec![Statement {
            effect: "Allow".to_string(),
            action: vec!["sts:AssumeRole".to_string()],
            resource: Vec::new(),
            principal: Some(serde_json::json!({ "Service": service_principal })),
        }])
    }

    /// Every resource referenced by any statement.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.statement
            .iter()
            .flat_map(|s| s.resource.iter().map(String::as_str))
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
