/// Implements `std::future::IntoFuture` for a type.
///
/// This macro takes a struct's `execute`-like method (which returns a Future)
/// and uses it to implement the `IntoFuture` trait. This allows instances of the
/// struct to be `.await`ed directly.
///
/// The future is type-erased as `Pin<Box<dyn Future + Send>>`, which incurs a
/// small heap allocation per request.
macro_rules! IntoFuture {
    (
        // The `impl` block for the type.
        impl $(<$($lt:lifetime $(,)?)? $($gen:ident),*>)? $name:ident $(<$($lt2:lifetime $(,)?)? $($gen2:ident),*>)?
        $([where $($wheres:tt)*])?
        {
            // The `execute` function to be wrapped.
            $(#[$meta:meta])*
            pub fn $func:ident ( $($args:tt)* ) -> impl Future<Output = $ret:ty> + $fut_life:lifetime $body:block
        }
    ) => {
        // Emit the function itself, with a `Send` bound added.
        impl $(<$($lt,)? $($gen),*>)? $name $(<$($lt2,)? $($gen2),*>)?
        $(where $($wheres)*)?
        {
            $(#[$meta])*
            pub fn $func($($args)*) -> impl ::std::future::Future<Output = $ret> + Send + $fut_life $body
        }

        impl $(<$($lt,)? $($gen),*>)? ::std::future::IntoFuture for $name $(<$($lt2,)? $($gen2),*>)?
        $(where $($wheres)*)?
        {
            type Output = $ret;
            type IntoFuture = ::std::pin::Pin<Box<dyn ::std::future::Future<Output = Self::Output> + Send + $fut_life>>;

            fn into_future(self) -> Self::IntoFuture {
                Box::pin(self.$func())
            }
        }
    };
}
