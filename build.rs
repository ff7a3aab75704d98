//! Build script to embed Windows resource metadata into the executable
//! This sets the application name shown in Task Manager

fn main() {
    #[cfg(windows)]
    {
        let mut res = winresource::WindowsResource::new();

        res.set("ProductName", "Super Productivite");
        res.set("CompanyName", "Super Productivite");
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));
        res.set("FileDescription", "SuperProductivite.Dashboard");
        res.set("InternalName", "SuperProductivite.Dashboard");
        res.set("OriginalFilename", "super_productivite.exe");

        if let Err(e) = res.compile() {
            eprintln!("Warning: Failed to compile Windows resources: {}", e);
        }
    }
}
