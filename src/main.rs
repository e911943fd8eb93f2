use miette::Result;
use rest_dispatch::RestDispatch;

#[async_std::main]
async fn main() -> Result<()> {
    RestDispatch::load().await
}
