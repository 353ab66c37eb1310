use std::sync::Arc;

/// A subscriber callback, shared so dispatch can invoke it without holding the registry lock.
pub type Callback<A> = Arc<dyn Fn(&A) + Send + Sync + 'static>;

/// Trait for types that can be converted into registry callbacks.
///
/// Returning `None` means "empty callback": the registry hands back a handle that was never subscribed.
pub trait IntoCallback<A> {
    fn into_callback(self) -> Option<Callback<A>>;
}

// Implementation for function types - multi-threaded
impl<F, A> IntoCallback<A> for F
where F: Fn(&A) + Send + Sync + 'static
{
    fn into_callback(self) -> Option<Callback<A>> { Some(Arc::new(self)) }
}

// An unset callback is accepted and ignored
impl<F, A> IntoCallback<A> for Option<F>
where F: Fn(&A) + Send + Sync + 'static
{
    fn into_callback(self) -> Option<Callback<A>> { self.map(|f| Arc::new(f) as Callback<A>) }
}

impl<A> IntoCallback<A> for Arc<dyn Fn(&A) + Send + Sync + 'static> {
    fn into_callback(self) -> Option<Callback<A>> { Some(self) }
}

impl<A> IntoCallback<A> for Option<Arc<dyn Fn(&A) + Send + Sync + 'static>> {
    fn into_callback(self) -> Option<Callback<A>> { self }
}

impl<A> IntoCallback<A> for std::sync::mpsc::Sender<A>
where A: Clone + Send + 'static
{
    fn into_callback(self) -> Option<Callback<A>> {
        // std Sender is Send + Sync since 1.72
        Some(Arc::new(move |args: &A| {
            let _ = self.send(args.clone()); // Ignore send errors
        }))
    }
}

#[cfg(feature = "tokio")]
impl<A> IntoCallback<A> for tokio::sync::mpsc::UnboundedSender<A>
where A: Clone + Send + 'static
{
    fn into_callback(self) -> Option<Callback<A>> {
        Some(Arc::new(move |args: &A| {
            let _ = self.send(args.clone()); // Ignore send errors
        }))
    }
}
