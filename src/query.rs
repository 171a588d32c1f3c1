//! What to do with a server's response to a candidate: `HeadQuery` only cares
//! about the status line, `GetQuery` also wants the body.

use crate::action::{GetAction, HeadAction};
use anyhow::Result;
use async_trait::async_trait;
use enum_dispatch::enum_dispatch;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::{Method, Response};

#[async_trait(?Send)]
#[enum_dispatch]
pub trait Query {
    fn method(&self) -> Method;
    async fn execute(&self, response: Response<Incoming>, target: &str) -> Result<()>;
}

#[enum_dispatch(Query)]
pub enum QueryStrategy {
    Head(HeadQuery),
    Get(GetQuery),
}

fn print_status_line(print_found: bool, verbose: bool, target: &str, status: u16) {
    let found = (200..300).contains(&status);
    if print_found && found {
        println!("[+] Status of {target}: {status}");
    } else if verbose {
        println!("[-] Status of {target}: {status}");
    }
}

pub struct HeadQuery {
    print_found: bool,
    verbose: bool,
    action: HeadAction,
}

impl HeadQuery {
    pub fn new(action: HeadAction, print_found: bool, verbose: bool) -> Self {
        HeadQuery {
            print_found,
            verbose,
            action,
        }
    }
}

#[async_trait(?Send)]
impl Query for HeadQuery {
    fn method(&self) -> Method {
        Method::HEAD
    }

    async fn execute(&self, response: Response<Incoming>, target: &str) -> Result<()> {
        let status = response.status().as_u16();
        // A HEAD response carries no body per the HTTP spec, but drain it
        // anyway in case a misbehaving server sends one.
        response.into_body().collect().await?;
        self.action.process(status, target)?;
        print_status_line(self.print_found, self.verbose, target, status);
        Ok(())
    }
}

pub struct GetQuery {
    print_found: bool,
    verbose: bool,
    action: GetAction,
}

impl GetQuery {
    pub fn new(action: GetAction, print_found: bool, verbose: bool) -> Self {
        GetQuery {
            print_found,
            verbose,
            action,
        }
    }
}

#[async_trait(?Send)]
impl Query for GetQuery {
    fn method(&self) -> Method {
        Method::GET
    }

    async fn execute(&self, response: Response<Incoming>, target: &str) -> Result<()> {
        let status = response.status().as_u16();
        let body = response.into_body().collect().await?.to_bytes();
        self.action.process(status, &body, target)?;
        print_status_line(self.print_found, self.verbose, target, status);
        Ok(())
    }
}
