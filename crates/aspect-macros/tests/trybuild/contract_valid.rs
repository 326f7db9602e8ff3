use aspect_macros::contract;

#[contract]
pub trait Reader {
    #[results(value)]
    fn read(&self, key: &str) -> Option<String>;
}

#[contract]
pub trait Writer: Reader {
    #[results(err)]
    fn write(&self, key: &str, value: &str) -> Result<(), String>;

    fn append(&self, key: &str, parts: &[String]);
}

fn main() {}
