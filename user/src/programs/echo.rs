use alloc::string::String;

use defines::config::MAXLINE;
use hal::DeviceBus;
use kernel::UserCtx;

use crate::{term_read, STDIN};

pub async fn main<H: DeviceBus>(ctx: UserCtx<H>) -> i32 {
    let mut buf = [0; MAXLINE];
    loop {
        let Ok(len) = term_read(&ctx, STDIN, &mut buf).await else {
            return -1;
        };
        let line: String = String::from_utf8_lossy(&buf[..len]).trim_end().into();
        if line == "quit" {
            break;
        }
        if println!(&ctx, "echo: {line}").await.is_err() {
            return -1;
        }
    }
    match println!(&ctx, "bye").await {
        Ok(()) => 0,
        Err(_) => -1,
    }
}
