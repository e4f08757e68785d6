//! High-level data access over a [`CommandExecutor`].
//!
//! A [`DataProvider`] binds input and output objects to parameters, hands the
//! command to its executor, writes output values back and materializes the
//! returned rows.
//!
//! ```rust,ignore
//! let provider = DataProvider::with_config(executor, Config::load("bind.yaml")?);
//!
//! let users: Vec<User> = provider
//!     .query("dbo.FindUsers", Some(&FindUsers { tenant: 3 }), None)
//!     .await?;
//!
//! let mut out = CreateOutcome::default();
//! provider
//!     .execute("dbo.CreateUser", Some(&new_user), Some(&mut out))
//!     .await?;
//! ```

mod executor;

pub use executor::{Command, CommandExecutor, ExecutedCommand, ResultSet};

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::binding::{write_back_outputs, ParameterBuilder};
use crate::config::Config;
use crate::core::{Bindable, BindableType, Shape, SqlField};
use crate::error::{BindError, Result};
use crate::mapping::{RowMapper, TypeMap, TypeMapCache};

/// Binds objects to commands and materializes their results.
pub struct DataProvider<E> {
    executor: E,
    type_maps: TypeMapCache,
    config: Config,
}

impl<E: CommandExecutor> DataProvider<E> {
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, Config::default())
    }

    pub fn with_config(executor: E, config: Config) -> Self {
        Self {
            executor,
            type_maps: TypeMapCache::new(),
            config,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn type_maps(&self) -> &TypeMapCache {
        &self.type_maps
    }

    /// Register `T` as a result type, notifying the executor on first use.
    pub fn register_type<T: BindableType>(&self) -> Arc<TypeMap> {
        self.register_shape(T::type_shape())
    }

    fn register_shape(&self, shape: &'static Shape) -> Arc<TypeMap> {
        let registration = self.type_maps.get_or_register(shape);
        if registration.newly_registered {
            self.executor.on_type_registered(&registration.map);
        }
        registration.map
    }

    /// Operations with `timeout` in place of the configured command timeout.
    ///
    /// ```rust,ignore
    /// provider
    ///     .with_timeout(Duration::from_secs(300))
    ///     .execute("dbo.Rebuild", None, None)
    ///     .await?;
    /// ```
    pub fn with_timeout(&self, timeout: Duration) -> Call<'_, E> {
        Call {
            provider: self,
            timeout: Some(timeout),
        }
    }

    fn call(&self) -> Call<'_, E> {
        Call {
            provider: self,
            timeout: None,
        }
    }

    /// Execute a command, returning the number of rows affected.
    pub async fn execute(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
        out_params: Option<&mut dyn Bindable>,
    ) -> Result<u64> {
        self.call().execute(text, in_params, out_params).await
    }

    /// Execute a command and materialize its first result set.
    ///
    /// A command returning no result sets yields an empty vector.
    pub async fn query<T: BindableType>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
        out_params: Option<&mut dyn Bindable>,
    ) -> Result<Vec<T>> {
        self.call().query(text, in_params, out_params).await
    }

    /// The first row of the first result set, if any.
    pub async fn query_first<T: BindableType>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<Option<T>> {
        self.call().query_first(text, in_params).await
    }

    /// The only row of the first result set, if any.
    ///
    /// More than one row is a [`BindError::Cardinality`] error.
    pub async fn query_single<T: BindableType>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<Option<T>> {
        self.call().query_single(text, in_params).await
    }

    /// The first column of the first row of the first result set.
    ///
    /// `None` when there is no row or the value is NULL.
    pub async fn execute_scalar<T: SqlField>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<Option<T>> {
        self.call().execute_scalar(text, in_params).await
    }

    /// Materialize several result sets at once, one per tuple element.
    ///
    /// ```rust,ignore
    /// let (orders, lines): (Vec<Order>, Vec<Line>) =
    ///     provider.query_multiple("dbo.GetOrder", Some(&key)).await?;
    /// ```
    pub async fn query_multiple<R: MultipleResults>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<R> {
        self.call().query_multiple(text, in_params).await
    }
}

/// Provider operations carrying per-call command settings.
///
/// Obtained from [`DataProvider::with_timeout`]; the methods mirror the
/// provider's own.
pub struct Call<'p, E> {
    provider: &'p DataProvider<E>,
    timeout: Option<Duration>,
}

impl<E: CommandExecutor> Call<'_, E> {
    /// The per-call timeout if set, else the configured one.
    fn timeout(&self) -> Option<Duration> {
        self.timeout
            .or_else(|| self.provider.config.provider.command_timeout())
    }

    async fn run(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
        out_params: Option<&mut dyn Bindable>,
    ) -> Result<ExecutedCommand> {
        let config = &self.provider.config;
        let (command, outputs) = {
            let builder = ParameterBuilder::new(in_params, out_params.as_deref())?;
            let command = Command {
                text: text.to_string(),
                command_type: config.provider.command_type,
                timeout: self.timeout(),
                parameters: builder.parameters(&config.binding)?,
            };
            (command, builder.into_outputs())
        };

        debug!(
            command = text,
            parameters = command.parameters.len(),
            timeout_secs = command.timeout.map(|t| t.as_secs()),
            "executing command"
        );
        let executed = self.provider.executor.execute(&command).await?;
        write_back_outputs(out_params, &outputs, &executed.parameters)?;
        Ok(executed)
    }

    pub async fn execute(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
        out_params: Option<&mut dyn Bindable>,
    ) -> Result<u64> {
        Ok(self.run(text, in_params, out_params).await?.rows_affected)
    }

    pub async fn query<T: BindableType>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
        out_params: Option<&mut dyn Bindable>,
    ) -> Result<Vec<T>> {
        let map = self.provider.register_type::<T>();
        let executed = self.run(text, in_params, out_params).await?;
        match executed.result_sets.into_iter().next() {
            Some(set) => read_set(map, set),
            None => Ok(Vec::new()),
        }
    }

    pub async fn query_first<T: BindableType>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<Option<T>> {
        Ok(self.query(text, in_params, None).await?.into_iter().next())
    }

    pub async fn query_single<T: BindableType>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<Option<T>> {
        let mut rows = self.query::<T>(text, in_params, None).await?;
        if rows.len() > 1 {
            return Err(BindError::Cardinality(format!(
                "{} returned {} rows for {} where at most one was expected",
                text,
                rows.len(),
                T::type_shape().type_name()
            )));
        }
        Ok(rows.pop())
    }

    pub async fn execute_scalar<T: SqlField>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<Option<T>> {
        let executed = self.run(text, in_params, None).await?;
        let value = executed
            .result_sets
            .into_iter()
            .next()
            .and_then(|set| set.rows.into_iter().next())
            .and_then(|row| row.into_iter().next());
        match value {
            Some(v) if !v.is_null() => T::from_sql(v)
                .map(Some)
                .map_err(|e| BindError::conversion(text, e)),
            _ => Ok(None),
        }
    }

    pub async fn query_multiple<R: MultipleResults>(
        &self,
        text: &str,
        in_params: Option<&dyn Bindable>,
    ) -> Result<R> {
        let maps = R::shapes()
            .into_iter()
            .map(|shape| self.provider.register_shape(shape))
            .collect();
        let executed = self.run(text, in_params, None).await?;
        R::read(maps, executed.result_sets)
    }
}

fn read_set<T: BindableType>(map: Arc<TypeMap>, set: ResultSet) -> Result<Vec<T>> {
    if set.rows.is_empty() {
        return Ok(Vec::new());
    }
    RowMapper::<T>::new(map, &set.columns)?.map_rows(set.rows)
}

fn read_next<T: BindableType>(
    maps: &mut impl Iterator<Item = Arc<TypeMap>>,
    sets: &mut impl Iterator<Item = ResultSet>,
) -> Result<Vec<T>> {
    let type_name = T::type_shape().type_name();
    let map = maps
        .next()
        .ok_or_else(|| BindError::Config(format!("no type map registered for {}", type_name)))?;
    let set = sets.next().ok_or_else(|| {
        BindError::Cardinality(format!("no result set left for {}", type_name))
    })?;
    read_set(map, set)
}

/// A tuple of result vectors read from consecutive result sets.
pub trait MultipleResults: Sized {
    /// Shapes of the element types, in result-set order.
    fn shapes() -> Vec<&'static Shape>;

    fn read(maps: Vec<Arc<TypeMap>>, sets: Vec<ResultSet>) -> Result<Self>;
}

macro_rules! impl_multiple_results {
    ($($t:ident),+) => {
        impl<$($t: BindableType),+> MultipleResults for ($(Vec<$t>,)+) {
            fn shapes() -> Vec<&'static Shape> {
                vec![$($t::type_shape()),+]
            }

            fn read(maps: Vec<Arc<TypeMap>>, sets: Vec<ResultSet>) -> Result<Self> {
                let mut maps = maps.into_iter();
                let mut sets = sets.into_iter();
                Ok(($(read_next::<$t>(&mut maps, &mut sets)?,)+))
            }
        }
    };
}

impl_multiple_results!(A);
impl_multiple_results!(A, B);
impl_multiple_results!(A, B, C);
impl_multiple_results!(A, B, C, D);
