//! End-to-end tests for `DataProvider` over an in-memory executor.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mssql_bind::binding::Direction;
use mssql_bind::{
    BindError, Bindable, ColumnInfo, Command, CommandExecutor, CommandType, Config, DataProvider,
    ExecutedCommand, ExecutorParameter, ParameterValue, ResultSet, SqlEnum, SqlType, SqlValue,
};

/// Records every command and answers with a canned response per call.
#[derive(Default)]
struct ScriptedExecutor {
    seen: Mutex<Vec<Command>>,
    responses: Mutex<Vec<ExecutedCommand>>,
}

impl ScriptedExecutor {
    fn answering(responses: Vec<ExecutedCommand>) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            responses: Mutex::new(responses),
        }
    }

    fn last(&self) -> Command {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &Command) -> mssql_bind::Result<ExecutedCommand> {
        self.seen.lock().unwrap().push(command.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(ExecutedCommand::default())
        } else {
            Ok(responses.remove(0))
        }
    }
}

#[derive(SqlEnum, Clone, Copy, Debug, PartialEq, Default)]
enum Role {
    #[default]
    Reader,
    Editor,
}

#[derive(Bindable, Default)]
struct Permission {
    #[bind(name = "Scope")]
    scope: String,
    #[bind(name = "CanWrite")]
    can_write: bool,
}

#[derive(Bindable, Default)]
struct CreateUser {
    #[bind(name = "UserName")]
    user_name: String,
    #[bind(name = "Role")]
    role: Role,
    #[bind(name = "Permissions")]
    permissions: Vec<Permission>,
}

#[derive(Bindable, Default, Debug)]
struct CreateOutcome {
    #[bind(name = "UserId")]
    user_id: Option<i32>,
    #[bind(name = "Created")]
    created: bool,
    #[bind(name = "Message", readonly)]
    message: String,
}

#[derive(Bindable, Default, Debug, PartialEq)]
struct User {
    #[bind(name = "Id")]
    id: i32,
    #[bind(name = "UserName")]
    user_name: String,
    #[bind(name = "Role")]
    role: Role,
}

#[derive(Bindable, Default, Debug, PartialEq)]
struct Grant {
    #[bind(name = "UserId")]
    user_id: i32,
    #[bind(name = "Scope")]
    scope: String,
}

fn users(rows: &[(i32, &str, &str)]) -> ResultSet {
    rows.iter().fold(
        ResultSet::new(vec![
            ColumnInfo::new("Id", SqlType::I32),
            ColumnInfo::new("UserName", SqlType::Text),
            ColumnInfo::new("Role", SqlType::Text),
        ]),
        |set, (id, name, role)| {
            set.with_row(vec![
                SqlValue::I32(*id),
                SqlValue::from(name.to_string()),
                SqlValue::from(role.to_string()),
            ])
        },
    )
}

fn config() -> Config {
    Config::from_yaml(
        r#"
provider:
  command_type: stored_procedure
  command_timeout_secs: 15
binding:
  table_types:
    Permissions: dbo.PermissionList
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_execute_binds_inputs_tables_and_outputs() {
    let executor = ScriptedExecutor::answering(vec![ExecutedCommand {
        rows_affected: 1,
        parameters: vec![
            ExecutorParameter::output("UserId", SqlValue::I32(42)),
            ExecutorParameter::output("created", SqlValue::I32(1)),
            ExecutorParameter::output("Message", SqlValue::from("welcome".to_string())),
        ],
        ..Default::default()
    }]);
    let provider = DataProvider::with_config(executor, config());

    let input = CreateUser {
        user_name: "grace".into(),
        role: Role::Editor,
        permissions: vec![
            Permission { scope: "docs".into(), can_write: true },
            Permission { scope: "admin".into(), can_write: false },
        ],
    };
    let mut outcome = CreateOutcome::default();
    let affected = provider
        .execute("dbo.CreateUser", Some(&input), Some(&mut outcome))
        .await
        .unwrap();

    assert_eq!(affected, 1);
    assert_eq!(outcome.user_id, Some(42));
    assert!(outcome.created);
    assert_eq!(outcome.message, "welcome");

    let command = provider.executor().last();
    assert_eq!(command.text, "dbo.CreateUser");
    assert_eq!(command.command_type, CommandType::StoredProcedure);
    assert_eq!(command.timeout, Some(Duration::from_secs(15)));

    let names: Vec<&str> = command.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["UserName", "Role", "Permissions", "UserId", "Created", "Message"]);

    assert_eq!(command.parameters[1].scalar_value(), Some(&SqlValue::from("Editor".to_string())));
    match &command.parameters[2].value {
        ParameterValue::Structured { type_name, table } => {
            assert_eq!(type_name, "dbo.PermissionList");
            let table = table.as_ref().unwrap();
            assert_eq!(table.rows.len(), 2);
            assert_eq!(table.rows[0][1], SqlValue::I32(1));
            assert_eq!(table.rows[1][1], SqlValue::I32(0));
        }
        other => panic!("expected a table value, got {:?}", other),
    }

    let outputs: Vec<&ExecutorParameter> =
        command.parameters.iter().filter(|p| p.is_output()).collect();
    assert_eq!(outputs.len(), 3);
    assert_eq!(outputs[0].scalar_value(), Some(&SqlValue::Null(SqlType::I32)));
    assert_eq!(outputs[1].direction, Direction::Output);
    assert_eq!(outputs[1].scalar_value(), Some(&SqlValue::I32(0)));
}

#[tokio::test]
async fn test_missing_output_is_binding_mismatch() {
    let executor = ScriptedExecutor::answering(vec![ExecutedCommand {
        parameters: vec![ExecutorParameter::output("UserId", SqlValue::I32(1))],
        ..Default::default()
    }]);
    let provider = DataProvider::new(executor);
    let mut outcome = CreateOutcome::default();
    let err = provider
        .execute("dbo.CreateUser", None, Some(&mut outcome))
        .await
        .unwrap_err();
    assert!(matches!(err, BindError::BindingMismatch { .. }), "{err:?}");
}

#[tokio::test]
async fn test_duplicate_names_across_inputs_and_outputs() {
    #[derive(Bindable, Default)]
    struct Key {
        #[bind(name = "userid")]
        user_id: i32,
    }

    let provider = DataProvider::new(ScriptedExecutor::default());
    let mut outcome = CreateOutcome::default();
    let err = provider
        .execute("dbo.CreateUser", Some(&Key { user_id: 1 }), Some(&mut outcome))
        .await
        .unwrap_err();
    assert!(matches!(err, BindError::Config(_)));
    assert!(provider.executor().seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_query_reads_enum_labels() {
    let provider = DataProvider::new(ScriptedExecutor::answering(vec![ExecutedCommand {
        result_sets: vec![users(&[(1, "ada", "Editor"), (2, "alan", "reader")])],
        ..Default::default()
    }]));
    let rows: Vec<User> = provider.query("dbo.Users", None, None).await.unwrap();
    assert_eq!(
        rows,
        vec![
            User { id: 1, user_name: "ada".into(), role: Role::Editor },
            User { id: 2, user_name: "alan".into(), role: Role::Reader },
        ]
    );
}

#[tokio::test]
async fn test_query_multiple_reads_sets_in_order() {
    let grants = ResultSet::new(vec![
        ColumnInfo::new("UserId", SqlType::I32),
        ColumnInfo::new("Scope", SqlType::Text),
    ])
    .with_row(vec![SqlValue::I32(1), SqlValue::from("docs".to_string())]);

    let provider = DataProvider::new(ScriptedExecutor::answering(vec![ExecutedCommand {
        result_sets: vec![users(&[(1, "ada", "Editor")]), grants],
        ..Default::default()
    }]));

    let (found, granted): (Vec<User>, Vec<Grant>) =
        provider.query_multiple("dbo.UserDetail", None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(granted, vec![Grant { user_id: 1, scope: "docs".into() }]);
    assert_eq!(provider.type_maps().len(), 2);
}

#[tokio::test]
async fn test_query_multiple_short_of_sets() {
    let provider = DataProvider::new(ScriptedExecutor::answering(vec![ExecutedCommand {
        result_sets: vec![users(&[])],
        ..Default::default()
    }]));
    let err = provider
        .query_multiple::<(Vec<User>, Vec<Grant>)>("dbo.UserDetail", None)
        .await
        .unwrap_err();
    assert!(matches!(err, BindError::Cardinality(_)));
}

#[tokio::test]
async fn test_execute_scalar_null_is_none() {
    let provider = DataProvider::new(ScriptedExecutor::answering(vec![ExecutedCommand {
        result_sets: vec![ResultSet::new(vec![ColumnInfo::new("n", SqlType::I32)])
            .with_row(vec![SqlValue::Null(SqlType::I32)])],
        ..Default::default()
    }]));
    assert_eq!(provider.execute_scalar::<i32>("select null", None).await.unwrap(), None);
}

#[tokio::test]
async fn test_per_call_timeout_replaces_configured_one() {
    let provider = DataProvider::with_config(ScriptedExecutor::default(), config());
    let slow = provider.with_timeout(Duration::from_secs(600));
    let input = CreateUser {
        user_name: "linus".into(),
        ..Default::default()
    };
    slow.execute("dbo.CreateUser", Some(&input), None).await.unwrap();
    assert_eq!(provider.executor().last().timeout, Some(Duration::from_secs(600)));

    let _: Vec<User> = provider.query("dbo.Users", None, None).await.unwrap();
    assert_eq!(provider.executor().last().timeout, Some(Duration::from_secs(15)));
}
