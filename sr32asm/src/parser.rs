use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "sr32.pest"]
pub struct SR32Parser;
