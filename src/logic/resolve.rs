use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::events::{
    publish_best_effort, publish_product_updates, EventPublisher, DEFAULT_PRODUCT_TOPIC,
};
use crate::logic::{build, build_entity, extract, parse_operation, ParseError};
use crate::model::{
    Cart, Entity, FieldSet, GraphQLRequest, GraphQLResponse, InputValue, Operation,
    OperationKind, OrderEvent, Product, ProductUpdateReport, RawRecord, SchemaRegistry,
    SelectedField, Value,
};
use crate::rpc::{RecordBackend, RpcError};

pub const DEFAULT_ORDER_TOPIC: &str = "order.created";

type Variables = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown {kind} field '{name}'")]
    UnknownRootField { kind: OperationKind, name: String },

    #[error("field '{field}' requires argument '{argument}'")]
    MissingArgument { field: String, argument: String },

    #[error("argument '{argument}' of '{field}' must be {expected}")]
    InvalidArgument {
        field: String,
        argument: String,
        expected: &'static str,
    },

    #[error("variable '${0}' is not defined")]
    UndefinedVariable(String),

    #[error(transparent)]
    Backend(#[from] RpcError),

    #[error("invalid JSON value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Gateway side of the field-mask contract.
///
/// Translates each root query field into one masked backend read and
/// rebuilds the result locally with the same mask.
pub struct Gateway {
    backend: Arc<dyn RecordBackend>,
    publisher: Arc<dyn EventPublisher>,
    schemas: Arc<SchemaRegistry>,
    order_topic: String,
    product_topic: String,
}

impl Gateway {
    pub fn new(
        backend: Arc<dyn RecordBackend>,
        publisher: Arc<dyn EventPublisher>,
        schemas: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            backend,
            publisher,
            schemas,
            order_topic: DEFAULT_ORDER_TOPIC.to_string(),
            product_topic: DEFAULT_PRODUCT_TOPIC.to_string(),
        }
    }

    pub fn with_order_topic(mut self, topic: &str) -> Self {
        self.order_topic = topic.to_string();
        self
    }

    pub fn with_product_topic(mut self, topic: &str) -> Self {
        self.product_topic = topic.to_string();
        self
    }

    /// Announce a batch of product changes on the product-update topic
    pub async fn publish_product_updates(
        &self,
        products: Vec<serde_json::Map<String, serde_json::Value>>,
    ) -> ProductUpdateReport {
        let report =
            publish_product_updates(self.publisher.as_ref(), &self.product_topic, products).await;
        info!("[gateway] {}", report.message);
        report
    }

    /// Execute a request, folding any failure into the GraphQL error list
    pub async fn execute(&self, request: &GraphQLRequest) -> GraphQLResponse {
        let empty = Variables::new();
        let variables = request.variables.as_ref().unwrap_or(&empty);
        match self.execute_document(&request.query, variables).await {
            Ok(data) => GraphQLResponse::data(data),
            Err(e) => {
                info!("[gateway] request failed: {}", e);
                GraphQLResponse::error(e.to_string())
            }
        }
    }

    async fn execute_document(
        &self,
        query: &str,
        variables: &Variables,
    ) -> Result<Variables, GatewayError> {
        let operation = parse_operation(query)?;
        let mut data = Variables::new();

        for root in &operation.root_fields {
            let args = Arguments {
                field: root,
                operation: &operation,
                variables,
            };
            let value = match operation.kind {
                OperationKind::Query => self.resolve_query(root, &args).await?,
                OperationKind::Mutation => self.resolve_mutation(root, &args).await?,
            };
            data.insert(root.response_key().to_string(), value);
        }

        Ok(data)
    }

    async fn resolve_query(
        &self,
        root: &SelectedField,
        args: &Arguments<'_>,
    ) -> Result<serde_json::Value, GatewayError> {
        if root.name == "__typename" {
            return Ok(serde_json::Value::String("Query".to_string()));
        }

        let schema = self
            .schemas
            .get(&root.name)
            .ok_or_else(|| GatewayError::UnknownRootField {
                kind: OperationKind::Query,
                name: root.name.clone(),
            })?;
        let key = args.string("id")?;

        let requested = extract(root);
        let mask = requested.restrict_to(&schema);
        let record = self.backend.get_record(schema.name(), &key, &mask).await?;

        // Re-mask locally, whatever the backend sent back
        Ok(serde_json::to_value(build(&schema, &record, &requested))?)
    }

    async fn resolve_mutation(
        &self,
        root: &SelectedField,
        args: &Arguments<'_>,
    ) -> Result<serde_json::Value, GatewayError> {
        match root.name.as_str() {
            "updateProduct" => {
                let record = RawRecord::from([
                    ("id".to_string(), Value::String(args.string("id")?)),
                    ("name".to_string(), Value::String(args.string("name")?)),
                    ("price".to_string(), Value::Float(args.float("price")?)),
                    (
                        "description".to_string(),
                        Value::String(args.string("description")?),
                    ),
                ]);
                let stored = self.backend.upsert_record(Product::schema().name(), record).await?;
                let product: Product = build_entity(&stored, &FieldSet::all(Product::schema()));
                Ok(serde_json::to_value(&product)?)
            }
            "createCart" => {
                let id = args.string("id")?;
                let record = RawRecord::from([
                    ("id".to_string(), Value::String(id.clone())),
                    ("product_id".to_string(), Value::String(args.string("productId")?)),
                    ("quantity".to_string(), Value::Int(args.int("quantity")?)),
                ]);
                self.backend.upsert_record(Cart::schema().name(), record).await?;
                Ok(format!("Cart {} created successfully.", id).into())
            }
            "workflowOrder" => {
                let event = OrderEvent {
                    id: args.string("orderId")?,
                    item_id: args.string("itemId")?,
                };
                let delivered = publish_best_effort(
                    self.publisher.as_ref(),
                    &self.order_topic,
                    serde_json::to_value(&event)?,
                )
                .await;
                let message = if delivered {
                    format!("Order event published for {}", event.id)
                } else {
                    format!("Order {} accepted, event delivery failed", event.id)
                };
                Ok(message.into())
            }
            _ => Err(GatewayError::UnknownRootField {
                kind: OperationKind::Mutation,
                name: root.name.clone(),
            }),
        }
    }
}

/// Argument accessor resolving `$variables` against the request, then
/// against the operation's declared defaults
struct Arguments<'a> {
    field: &'a SelectedField,
    operation: &'a Operation,
    variables: &'a Variables,
}

impl Arguments<'_> {
    fn value(&self, name: &str) -> Result<Value, GatewayError> {
        let input = self
            .field
            .argument(name)
            .ok_or_else(|| GatewayError::MissingArgument {
                field: self.field.name.clone(),
                argument: name.to_string(),
            })?;
        self.resolve(name, input)
    }

    fn resolve(&self, name: &str, input: &InputValue) -> Result<Value, GatewayError> {
        Ok(match input {
            InputValue::Null => Value::Null,
            InputValue::Bool(b) => Value::Bool(*b),
            InputValue::Int(i) => Value::Int(*i),
            InputValue::Float(x) => Value::Float(*x),
            InputValue::String(s) => Value::String(s.clone()),
            // No argument of the served schema is an enum
            InputValue::Enum(_) => return Err(self.invalid(name, "a literal, not an enum value")),
            InputValue::Variable(var) => match self.variables.get(var) {
                Some(json) => serde_json::from_value(json.clone())?,
                // Defaults are constants, so this does not recurse further
                None => match self.operation.variable_default(var) {
                    Some(default) => return self.resolve(name, default),
                    None => return Err(GatewayError::UndefinedVariable(var.clone())),
                },
            },
        })
    }

    fn invalid(&self, name: &str, expected: &'static str) -> GatewayError {
        GatewayError::InvalidArgument {
            field: self.field.name.clone(),
            argument: name.to_string(),
            expected,
        }
    }

    fn string(&self, name: &str) -> Result<String, GatewayError> {
        match self.value(name)? {
            Value::String(s) => Ok(s),
            // GraphQL ID arguments may be written as integers
            Value::Int(i) => Ok(i.to_string()),
            _ => Err(self.invalid(name, "a string")),
        }
    }

    fn int(&self, name: &str) -> Result<i64, GatewayError> {
        self.value(name)?
            .as_i64()
            .ok_or_else(|| self.invalid(name, "an integer"))
    }

    fn float(&self, name: &str) -> Result<f64, GatewayError> {
        self.value(name)?
            .as_f64()
            .ok_or_else(|| self.invalid(name, "a number"))
    }
}
