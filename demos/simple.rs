fn main() {
    let glob = pathglob::glob("**/*.rs").unwrap();

    for entry in glob.list_sync().unwrap() {
        println!("{}", entry.path.display());
    }
}
