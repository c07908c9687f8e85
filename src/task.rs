use crate::{
    auto_traits::{TaskFailure, TaskValue},
    error::Rejection,
};

use futures::future::BoxFuture;

/// A boxed task, for lists mixing different closures.
pub type Task<T, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, E>> + Send>;

/// Boxes a closure returning a future into a [`Task`].
pub fn task<T, E, F, Fut>(f: F) -> Task<T, E>
where
    T: TaskValue,
    E: TaskFailure,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::new(move || Box::pin(f()) as BoxFuture<'static, Result<T, E>>)
}

/// Settled outcome of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult<T, E> {
    Fulfilled(T),
    Rejected(Rejection<E>),
}

impl<T, E> TaskResult<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, TaskResult::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TaskResult::Rejected(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            TaskResult::Fulfilled(value) => Some(value),
            TaskResult::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection<E>> {
        match self {
            TaskResult::Fulfilled(_) => None,
            TaskResult::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn into_result(self) -> Result<T, Rejection<E>> {
        match self {
            TaskResult::Fulfilled(value) => Ok(value),
            TaskResult::Rejected(rejection) => Err(rejection),
        }
    }
}

impl<T, E> From<Result<T, Rejection<E>>> for TaskResult<T, E> {
    fn from(result: Result<T, Rejection<E>>) -> Self {
        match result {
            Ok(value) => TaskResult::Fulfilled(value),
            Err(rejection) => TaskResult::Rejected(rejection),
        }
    }
}
