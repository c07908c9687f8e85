pub trait TaskValue: Send + 'static {}
impl<T: Send + 'static> TaskValue for T {}

pub trait TaskFailure: Send + 'static {}
impl<E: Send + 'static> TaskFailure for E {}
