use std::pin::Pin;
use std::sync::Arc;

use derive_more::{IsVariant, Unwrap};
use futures::Future;

use crate::commands::request::{ClassicRequest, SlashRequest};
use crate::commands::CommandResult;
use crate::Context;

#[cfg(test)]
pub mod mock {
    use super::*;

    pub async fn classic(_ctx: Context, req: ClassicRequest) -> CommandResult {
        println!("CLASSIC REQ: {req:#?}");
        Ok(())
    }

    pub async fn slash(_ctx: Context, req: SlashRequest) -> CommandResult {
        println!("SLASH REQ: {req:#?}");
        Ok(())
    }
}

/// Non-generic return type for async command functions.
pub type CallFuture = Pin<Box<dyn Future<Output = CommandResult> + Send>>;

macro_rules! function_trait {
    ($request:ty => $var:path) => {
        impl<F, Fut> Callable<$request> for F
        where
            F: Fn(Context, $request) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = CommandResult> + Send + 'static,
        {
            fn call(&self, ctx: Context, req: $request) -> CallFuture {
                Box::pin((self)(ctx, req))
            }
        }

        impl Callable<$request> for Arc<dyn Callable<$request>> {
            fn call(&self, ctx: Context, req: $request) -> CallFuture {
                (**self).call(ctx, req)
            }

            fn into_shared(self) -> Arc<dyn Callable<$request>> {
                self
            }
        }

        impl<T> IntoFunction<$request> for T
        where
            T: Callable<$request> + 'static,
        {
            fn into_function(self) -> Function {
                $var(self.into_shared())
            }
        }
    };
}

// Function that can handle basic text command.
function_trait!(ClassicRequest => Function::Classic);
// Function that can handle interactive text command.
function_trait!(SlashRequest => Function::Slash);

pub type ClassicFunction = Arc<dyn Callable<ClassicRequest>>;
pub type SlashFunction = Arc<dyn Callable<SlashRequest>>;

/// Trait for functions that can be called with a generic request.
pub trait Callable<R, O = CallFuture>: Send + Sync {
    fn call(&self, ctx: Context, req: R) -> O;
    fn into_shared(self) -> Arc<dyn Callable<R, O>>
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

/// Trait for converting something callable into a specific supported type.
pub trait IntoFunction<R> {
    fn into_function(self) -> Function;
}

/// Supported function types.
#[derive(Clone, Unwrap, IsVariant)]
pub enum Function {
    Classic(ClassicFunction),
    Slash(SlashFunction),
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Classic(_) => "Function::Classic(_)",
            Self::Slash(_) => "Function::Slash(_)",
        };
        write!(f, "{text}")
    }
}
